//! # Attendance Tracker Backend
//!
//! Layered like this:
//! ```text
//! IO Layer (REST API, mappers)
//!     ↓
//! Domain Layer (attendance repository, scan, reports)
//!     ↓
//! Storage Layer (remote store, local cache)
//! ```
//!
//! `initialize_backend` builds the configured stores, loads the roster and
//! hands back the `AppState`; `create_router` wires it into axum.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AppConfig, RemoteBackend};
use crate::domain::{
    AttendanceRepository, Clock, ReportService, RepositoryOptions, ScanService, SystemClock,
};
use crate::storage::{JsonFileCache, PostgrestRemoteStore, RemoteStore, SqliteRemoteStore};

/// Main application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: AttendanceRepository,
    pub scan_service: ScanService,
    pub report_service: ReportService,
}

impl AppState {
    pub fn new(repository: AttendanceRepository) -> Self {
        Self {
            scan_service: ScanService::new(repository.clone()),
            report_service: ReportService::new(repository.clone()),
            repository,
        }
    }
}

/// Build the stores named by `config`, load the roster and return the state
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up remote store");
    let remote: Arc<dyn RemoteStore> = match &config.remote {
        RemoteBackend::Sqlite { database_url } => Arc::new(
            SqliteRemoteStore::new(database_url)
                .await
                .with_context(|| format!("Failed to open {}", database_url))?,
        ),
        RemoteBackend::Postgrest { base_url, api_key } => Arc::new(
            PostgrestRemoteStore::new(base_url.as_str(), api_key.as_str(), config.remote_timeout)
                .context("Failed to build REST client")?,
        ),
    };

    info!("Setting up local cache at {:?}", config.cache_path);
    let cache = Arc::new(JsonFileCache::new(&config.cache_path));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let repository = AttendanceRepository::new(
        remote,
        cache,
        clock,
        RepositoryOptions {
            remote_timeout: config.remote_timeout,
            auto_persist: config.auto_persist,
        },
    );
    repository.load().await;

    info!("Setting up application state");
    Ok(AppState::new(repository))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin {:?}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .with_state(app_state))
}
