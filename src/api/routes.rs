//! Route definitions and handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::Result;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/publications/{id}", get(get_publication))
        .route("/api/v1/publications/{id}/payload", get(get_payload))
        .route("/api/v1/publications/{id}/file-sizes", get(get_file_sizes))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Artefact metadata by id; 404 when unknown.
async fn get_publication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let artefact = state.publication_service.get_publication(id).await?;
    Ok(Json(artefact))
}

/// Stored payload bytes for an artefact.
async fn get_payload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let payload = state.publication_service.get_stored_publication(id).await?;
    Ok(payload)
}

/// Sizes of whichever rendered files exist; absent slots are null.
async fn get_file_sizes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let sizes = state.file_service.get_file_sizes(id).await?;
    Ok(Json(sizes))
}
