//! HTTP API surface.
//!
//! Only the read side lives here (health plus publication lookups); the
//! ingestion surface is fed by upstream channel-management services.

pub mod routes;

use std::sync::Arc;

use crate::services::publication_file_service::PublicationFileService;
use crate::services::publication_service::PublicationService;

/// Shared application state for request handlers
pub struct AppState {
    pub publication_service: Arc<PublicationService>,
    pub file_service: Arc<PublicationFileService>,
}

impl AppState {
    pub fn new(
        publication_service: Arc<PublicationService>,
        file_service: Arc<PublicationFileService>,
    ) -> Self {
        Self {
            publication_service,
            file_service,
        }
    }
}
