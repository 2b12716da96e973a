//! Artefact persistence.
//!
//! The `ArtefactStore` trait is the narrow seam between the publication
//! workflow and the database; the Postgres implementation maps the storage
//! engine's lock-conflict SQLSTATEs onto `AppError::LockAcquisition` so the
//! save retry loop can tell transient contention apart from fatal failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::artefact::{Artefact, ArtefactIdentity};

const ARTEFACT_COLUMNS: &str = r#"
    artefact_id, source_artefact_id, artefact_type, sensitivity, language,
    provenance, location_id, content_date, list_type, display_from, display_to,
    last_received_date, expiry_date, superseded_count, payload_size_kb,
    search, is_flat_file
"#;

/// Artefact store seam.
///
/// `save` may fail with `AppError::LockAcquisition` under concurrent writes
/// to the same identity; callers retry through the publication service's
/// bounded retry loop. Every other error is fatal to the operation.
#[async_trait]
pub trait ArtefactStore: Send + Sync {
    /// Look up the current artefact sharing the given business identity.
    /// Content date equality is exact. No side effects.
    async fn find_by_identity(&self, identity: &ArtefactIdentity) -> Result<Option<Artefact>>;

    /// Look up an artefact by its surrogate id.
    async fn find_by_id(&self, artefact_id: Uuid) -> Result<Option<Artefact>>;

    /// Upsert the artefact row keyed on `artefact_id`.
    async fn save(&self, artefact: &Artefact) -> Result<Artefact>;

    /// Artefacts whose display window opened in `(since, now]`.
    async fn find_newly_active(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Artefact>>;

    /// Artefacts whose expiry date has passed.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Artefact>>;

    /// Remove an artefact row.
    async fn delete(&self, artefact_id: Uuid) -> Result<()>;
}

/// Postgres-backed artefact store
pub struct PostgresArtefactStore {
    db: PgPool,
}

impl PostgresArtefactStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Lock-conflict SQLSTATEs that are expected to succeed on retry:
/// lock_not_available, serialization_failure, deadlock_detected.
fn is_transient_lock_code(code: &str) -> bool {
    matches!(code, "55P03" | "40001" | "40P01")
}

/// Map a write failure, surfacing transient lock conflicts distinctly.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if let Some(code) = db_err.code() {
            if is_transient_lock_code(&code) {
                return AppError::LockAcquisition(db_err.to_string());
            }
        }
    }
    AppError::Database(e.to_string())
}

#[async_trait]
impl ArtefactStore for PostgresArtefactStore {
    async fn find_by_identity(&self, identity: &ArtefactIdentity) -> Result<Option<Artefact>> {
        let artefact = sqlx::query_as::<_, Artefact>(&format!(
            r#"
            SELECT {ARTEFACT_COLUMNS}
            FROM artefacts
            WHERE location_id = $1
              AND content_date = $2
              AND language = $3
              AND list_type = $4
              AND provenance = $5
            "#
        ))
        .bind(&identity.location_id)
        .bind(identity.content_date)
        .bind(identity.language)
        .bind(identity.list_type)
        .bind(&identity.provenance)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(artefact)
    }

    async fn find_by_id(&self, artefact_id: Uuid) -> Result<Option<Artefact>> {
        let artefact = sqlx::query_as::<_, Artefact>(&format!(
            "SELECT {ARTEFACT_COLUMNS} FROM artefacts WHERE artefact_id = $1"
        ))
        .bind(artefact_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(artefact)
    }

    async fn save(&self, artefact: &Artefact) -> Result<Artefact> {
        let saved = sqlx::query_as::<_, Artefact>(&format!(
            r#"
            INSERT INTO artefacts (
                artefact_id, source_artefact_id, artefact_type, sensitivity,
                language, provenance, location_id, content_date, list_type,
                display_from, display_to, last_received_date, expiry_date,
                superseded_count, payload_size_kb, search, is_flat_file
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (artefact_id) DO UPDATE SET
                source_artefact_id = EXCLUDED.source_artefact_id,
                artefact_type = EXCLUDED.artefact_type,
                sensitivity = EXCLUDED.sensitivity,
                language = EXCLUDED.language,
                provenance = EXCLUDED.provenance,
                location_id = EXCLUDED.location_id,
                content_date = EXCLUDED.content_date,
                list_type = EXCLUDED.list_type,
                display_from = EXCLUDED.display_from,
                display_to = EXCLUDED.display_to,
                last_received_date = EXCLUDED.last_received_date,
                expiry_date = EXCLUDED.expiry_date,
                superseded_count = EXCLUDED.superseded_count,
                payload_size_kb = EXCLUDED.payload_size_kb,
                search = EXCLUDED.search,
                is_flat_file = EXCLUDED.is_flat_file
            RETURNING {ARTEFACT_COLUMNS}
            "#
        ))
        .bind(artefact.artefact_id)
        .bind(&artefact.source_artefact_id)
        .bind(artefact.artefact_type)
        .bind(artefact.sensitivity)
        .bind(artefact.language)
        .bind(&artefact.provenance)
        .bind(&artefact.location_id)
        .bind(artefact.content_date)
        .bind(artefact.list_type)
        .bind(artefact.display_from)
        .bind(artefact.display_to)
        .bind(artefact.last_received_date)
        .bind(artefact.expiry_date)
        .bind(artefact.superseded_count)
        .bind(artefact.payload_size_kb)
        .bind(&artefact.search)
        .bind(artefact.is_flat_file)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;

        Ok(saved)
    }

    async fn find_newly_active(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Artefact>> {
        let artefacts = sqlx::query_as::<_, Artefact>(&format!(
            r#"
            SELECT {ARTEFACT_COLUMNS}
            FROM artefacts
            WHERE display_from IS NOT NULL
              AND display_from > $1
              AND display_from <= $2
            ORDER BY display_from
            "#
        ))
        .bind(since)
        .bind(now)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(artefacts)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Artefact>> {
        let artefacts = sqlx::query_as::<_, Artefact>(&format!(
            "SELECT {ARTEFACT_COLUMNS} FROM artefacts WHERE expiry_date < $1 ORDER BY expiry_date"
        ))
        .bind(now)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(artefacts)
    }

    async fn delete(&self, artefact_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM artefacts WHERE artefact_id = $1")
            .bind(artefact_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Artefact not found: {}",
                artefact_id
            )));
        }

        Ok(())
    }
}
