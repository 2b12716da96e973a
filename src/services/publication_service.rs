//! Publication creation workflow.
//!
//! Drives one submission end to end: resolve the business identity, decide
//! create-vs-update (carrying the superseded count forward), stamp received
//! and expiry dates, extract search terms for JSON payloads, and persist
//! through a bounded retry loop that tolerates transient lock conflicts.
//!
//! Concurrency correctness for "one winner per identity" is delegated to the
//! database's own locking; the retry loop only ensures well-behaved
//! concurrent submitters don't see spurious total failures.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::artefact::{
    Artefact, ArtefactIdentity, ArtefactType, Language, ListType, Sensitivity,
};
use crate::repository::ArtefactStore;
use crate::services::search_extraction::PayloadExtractor;
use crate::storage::BlobStore;

/// Maximum save attempts before the last lock failure is rethrown.
pub const MAX_SAVE_ATTEMPTS: u32 = 10;

const RETRY_BACKOFF_BASE_MS: u64 = 100;
const RETRY_BACKOFF_MAX_MS: u64 = 1_000;

/// Submitted payload. Flat-file publications are opaque documents that skip
/// search extraction entirely.
#[derive(Debug, Clone)]
pub enum PublicationPayload {
    Json(String),
    FlatFile(Bytes),
}

impl PublicationPayload {
    pub fn is_flat_file(&self) -> bool {
        matches!(self, PublicationPayload::FlatFile(_))
    }

    fn as_bytes(&self) -> Bytes {
        match self {
            PublicationPayload::Json(body) => Bytes::from(body.clone().into_bytes()),
            PublicationPayload::FlatFile(bytes) => bytes.clone(),
        }
    }
}

/// One inbound publication submission.
#[derive(Debug, Clone)]
pub struct PublicationSubmission {
    pub source_artefact_id: String,
    pub artefact_type: ArtefactType,
    pub sensitivity: Sensitivity,
    pub language: Language,
    pub provenance: String,
    pub location_id: String,
    pub content_date: DateTime<Utc>,
    pub list_type: ListType,
    pub display_from: Option<DateTime<Utc>>,
    pub display_to: Option<DateTime<Utc>>,
    pub payload: PublicationPayload,
}

impl PublicationSubmission {
    /// Business identity key of this submission.
    pub fn identity(&self) -> ArtefactIdentity {
        ArtefactIdentity {
            location_id: self.location_id.clone(),
            content_date: self.content_date,
            language: self.language,
            list_type: self.list_type,
            provenance: self.provenance.clone(),
        }
    }
}

/// Expiry stamp for a freshly received publication. SJP lists stay live for
/// a week; anything else expires same-day unless the display window says
/// otherwise.
fn expiry_date(
    list_type: ListType,
    display_to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if list_type.has_weekly_expiry() {
        now + ChronoDuration::days(7)
    } else {
        display_to.unwrap_or(now)
    }
}

/// Blob key for the stored payload of an artefact.
pub fn payload_key(artefact_id: Uuid, is_flat_file: bool) -> String {
    if is_flat_file {
        format!("{artefact_id}")
    } else {
        format!("{artefact_id}.json")
    }
}

/// Publication service
pub struct PublicationService {
    store: Arc<dyn ArtefactStore>,
    extractor: Arc<dyn PayloadExtractor>,
    blob: Arc<dyn BlobStore>,
}

impl PublicationService {
    /// Create a new publication service
    pub fn new(
        store: Arc<dyn ArtefactStore>,
        extractor: Arc<dyn PayloadExtractor>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            store,
            extractor,
            blob,
        }
    }

    /// Create or update a publication.
    ///
    /// A submission whose identity matches an existing artefact replaces it:
    /// the surviving record keeps the old `artefact_id` and its superseded
    /// count goes up by exactly one, decided once before the write so retry
    /// attempts cannot inflate it.
    pub async fn create_publication(&self, submission: PublicationSubmission) -> Result<Artefact> {
        let identity = submission.identity();
        let existing = self.store.find_by_identity(&identity).await?;

        let now = Utc::now();
        let artefact = self.build_artefact(&submission, existing.as_ref(), now).await?;

        let saved = self.save_with_retry(&artefact).await?;

        self.blob
            .put(
                &payload_key(saved.artefact_id, saved.is_flat_file),
                submission.payload.as_bytes(),
            )
            .await?;

        if saved.is_flat_file {
            tracing::info!(
                artefact_id = %saved.artefact_id,
                provenance = %saved.provenance,
                location_id = %saved.location_id,
                "Uploaded flat file publication"
            );
        } else {
            tracing::info!(
                artefact_id = %saved.artefact_id,
                provenance = %saved.provenance,
                location_id = %saved.location_id,
                "Uploaded json publication"
            );
        }

        Ok(saved)
    }

    /// Fetch an artefact's metadata; missing rows surface as not-found.
    pub async fn get_publication(&self, artefact_id: Uuid) -> Result<Artefact> {
        self.store
            .find_by_id(artefact_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Artefact not found: {}", artefact_id)))
    }

    /// Fetch the stored payload for an artefact.
    pub async fn get_stored_publication(&self, artefact_id: Uuid) -> Result<Bytes> {
        let artefact = self.get_publication(artefact_id).await?;
        self.blob
            .get(&payload_key(artefact.artefact_id, artefact.is_flat_file))
            .await
    }

    /// Assemble the record to persist: supersession bookkeeping, date
    /// stamps, and the search index for JSON payloads.
    async fn build_artefact(
        &self,
        submission: &PublicationSubmission,
        existing: Option<&Artefact>,
        now: DateTime<Utc>,
    ) -> Result<Artefact> {
        // Identity continuity: an update keeps the old surrogate id and
        // increments the superseded count exactly once.
        let (artefact_id, superseded_count) = match existing {
            Some(old) => (old.artefact_id, old.superseded_count + 1),
            None => (Uuid::new_v4(), 0),
        };

        let search = match &submission.payload {
            PublicationPayload::Json(body) => {
                Some(self.extractor.extract_search_terms(body).await?)
            }
            PublicationPayload::FlatFile(_) => None,
        };

        let payload_bytes = submission.payload.as_bytes();

        Ok(Artefact {
            artefact_id,
            source_artefact_id: submission.source_artefact_id.clone(),
            artefact_type: submission.artefact_type,
            sensitivity: submission.sensitivity,
            language: submission.language,
            provenance: submission.provenance.clone(),
            location_id: submission.location_id.clone(),
            content_date: submission.content_date,
            list_type: submission.list_type,
            display_from: submission.display_from,
            display_to: submission.display_to,
            last_received_date: now,
            expiry_date: expiry_date(submission.list_type, submission.display_to, now),
            superseded_count,
            payload_size_kb: Some(payload_bytes.len() as f32 / 1024.0),
            search,
            is_flat_file: submission.payload.is_flat_file(),
        })
    }

    /// Save with a bounded retry loop.
    ///
    /// Only transient lock conflicts are retried, up to `MAX_SAVE_ATTEMPTS`
    /// total attempts with a capped linear backoff; the final lock failure
    /// is rethrown unchanged. Every other error propagates immediately.
    async fn save_with_retry(&self, artefact: &Artefact) -> Result<Artefact> {
        let mut attempt: u32 = 1;
        loop {
            match self.store.save(artefact).await {
                Ok(saved) => return Ok(saved),
                Err(AppError::LockAcquisition(msg)) if attempt < MAX_SAVE_ATTEMPTS => {
                    let delay =
                        (RETRY_BACKOFF_BASE_MS * u64::from(attempt)).min(RETRY_BACKOFF_MAX_MS);
                    tracing::debug!(
                        artefact_id = %artefact.artefact_id,
                        attempt,
                        delay_ms = delay,
                        "Lock conflict saving artefact, retrying: {}",
                        msg
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
