//! Rendered file generation seam.
//!
//! Actual HTML/PDF/Excel rendering is performed by an external collaborator
//! per list type; this crate only consumes the resulting byte buffers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::publication_files::PublicationFiles;

/// Produces the rendered file set for an artefact.
#[async_trait]
pub trait FileGenerator: Send + Sync {
    /// Render the publication. `Ok(None)` means generation was not possible
    /// for this payload; the caller logs and moves on without uploading.
    async fn generate(&self, artefact_id: Uuid, payload: &[u8])
        -> Result<Option<PublicationFiles>>;
}

/// Placeholder generator used when no rendering engine is configured.
/// Reports generation as unavailable so no uploads occur.
pub struct DisabledFileGenerator;

#[async_trait]
impl FileGenerator for DisabledFileGenerator {
    async fn generate(
        &self,
        artefact_id: Uuid,
        _payload: &[u8],
    ) -> Result<Option<PublicationFiles>> {
        tracing::debug!(%artefact_id, "File generation not configured, skipping");
        Ok(None)
    }
}
