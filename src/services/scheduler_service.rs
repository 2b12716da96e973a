//! Background task scheduler.
//!
//! Runs two independent periodic sweeps: reporting artefacts whose display
//! window has opened, and the daily maintenance pass that tears down expired
//! artefacts (rows, payloads and rendered files). Each task catches and logs
//! its own failures so one cannot starve the other.

use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};

use crate::config::Config;
use crate::error::Result;
use crate::repository::ArtefactStore;
use crate::services::publication_file_service::PublicationFileService;
use crate::services::publication_service::payload_key;
use crate::storage::BlobStore;

/// Spawn both background scheduler tasks (fire-and-forget).
pub fn spawn_all(
    store: Arc<dyn ArtefactStore>,
    file_service: Arc<PublicationFileService>,
    blob: Arc<dyn BlobStore>,
    config: Config,
) {
    // Newly-active artefact sweep
    {
        let store = store.clone();
        let sweep_secs = config.activation_sweep_secs;
        tokio::spawn(async move {
            let mut since = Utc::now();
            let mut ticker = interval(Duration::from_secs(sweep_secs.max(1)));
            ticker.tick().await; // first tick completes immediately

            loop {
                ticker.tick().await;
                let now = Utc::now();
                match check_newly_active_artefacts(store.as_ref(), since, now).await {
                    Ok(count) => {
                        if count > 0 {
                            tracing::info!(count, "Newly active artefacts reported");
                        }
                        since = now;
                    }
                    Err(e) => {
                        // Keep `since` so the window is retried next tick
                        tracing::warn!("Newly-active artefact sweep failed: {}", e);
                    }
                }
            }
        });
    }

    // Daily maintenance: expired artefact teardown
    {
        let store = store.clone();
        let cron_expr = config.daily_maintenance_cron.clone();
        tokio::spawn(async move {
            loop {
                let wait = match compute_next_run(&cron_expr) {
                    Some(next) => (next - Utc::now())
                        .to_std()
                        .unwrap_or(Duration::from_secs(1)),
                    None => Duration::from_secs(24 * 3600),
                };
                sleep(wait.max(Duration::from_secs(1))).await;

                match run_daily_tasks(store.as_ref(), &file_service, blob.as_ref()).await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "Daily maintenance removed expired artefacts");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Daily maintenance sweep failed: {}", e);
                    }
                }
            }
        });
    }

    tracing::info!("Background schedulers started: activation sweep, daily maintenance");
}

/// Report artefacts whose display window opened in `(since, now]`.
/// Downstream subscription fan-out is handled by an external service; here
/// each newly displayable artefact is surfaced once.
pub async fn check_newly_active_artefacts(
    store: &dyn ArtefactStore,
    since: chrono::DateTime<Utc>,
    now: chrono::DateTime<Utc>,
) -> Result<usize> {
    let artefacts = store.find_newly_active(since, now).await?;

    for artefact in &artefacts {
        tracing::info!(
            artefact_id = %artefact.artefact_id,
            location_id = %artefact.location_id,
            list_type = ?artefact.list_type,
            "Artefact is now displayable"
        );
    }

    Ok(artefacts.len())
}

/// Delete expired artefacts: rendered files, stored payload, then the row.
pub async fn run_daily_tasks(
    store: &dyn ArtefactStore,
    file_service: &PublicationFileService,
    blob: &dyn BlobStore,
) -> Result<usize> {
    let expired = store.find_expired(Utc::now()).await?;
    let mut removed = 0;

    for artefact in expired {
        if let Err(e) = file_service
            .delete_files(artefact.artefact_id, artefact.list_type, artefact.language)
            .await
        {
            tracing::warn!(
                artefact_id = %artefact.artefact_id,
                "Failed to delete rendered files for expired artefact: {}",
                e
            );
            continue;
        }

        blob.delete(&payload_key(artefact.artefact_id, artefact.is_flat_file))
            .await?;
        store.delete(artefact.artefact_id).await?;
        removed += 1;
    }

    Ok(removed)
}

/// Parse a cron expression and compute the next run time.
fn compute_next_run(cron_expr: &str) -> Option<chrono::DateTime<Utc>> {
    // The cron crate expects 6/7-field expressions (with seconds) but
    // config typically carries 5-field ones. Prepend "0 " for seconds when
    // a 5-field expression is detected.
    let normalized = if cron_expr.split_whitespace().count() == 5 {
        format!("0 {}", cron_expr)
    } else {
        cron_expr.to_string()
    };

    match Schedule::from_str(&normalized) {
        Ok(schedule) => schedule.upcoming(Utc).next(),
        Err(e) => {
            tracing::warn!(
                "Invalid cron expression '{}': {}. Falling back to 24h from now.",
                cron_expr,
                e
            );
            Some(Utc::now() + chrono::Duration::hours(24))
        }
    }
}
