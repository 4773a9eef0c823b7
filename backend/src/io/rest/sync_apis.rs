//! # REST API for Repository Lifecycle
//!
//! Reconciling pending changes with the remote store, reloading the roster,
//! persisting the local cache and reporting sync status.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::info;

use super::mappers::SyncMapper;
use crate::AppState;
use shared::{LoadResponse, ReconcileResponse, StatusResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync/reconcile", post(reconcile))
        .route("/sync/reload", post(reload))
        .route("/sync/save", post(save))
        .route("/status", get(status))
}

/// Push every pending change to the remote store
pub async fn reconcile(State(state): State<AppState>) -> Json<ReconcileResponse> {
    info!("POST /api/sync/reconcile");
    Json(SyncMapper::to_reconcile_dto(state.repository.reconcile().await))
}

/// Reload the roster from the remote store, or the cache if it is down
pub async fn reload(State(state): State<AppState>) -> Json<LoadResponse> {
    info!("POST /api/sync/reload");
    Json(SyncMapper::to_load_dto(state.repository.reload().await))
}

/// Write the roster to the local cache now
pub async fn save(State(state): State<AppState>) -> StatusCode {
    info!("POST /api/sync/save");
    state.repository.save().await;
    StatusCode::NO_CONTENT
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    info!("GET /api/status");
    Json(SyncMapper::to_status_dto(state.repository.status().await))
}
