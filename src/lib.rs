//! Deepfake Detector Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod detection;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;

pub use config::Config;
pub use db::{open_database, Db};
pub use detection::Detector;
pub use error::{AppError, Result};
pub use session::SessionStore;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

/// Headroom over the video size limit for multipart boundaries and headers
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub sessions: SessionStore,
    pub detector: Detector,
}

impl AppState {
    /// Create a new AppState; sessions start empty
    pub fn new(db: Db, config: Config, detector: Detector) -> Self {
        let sessions = SessionStore::new(config.session_ttl_secs);
        Self {
            db,
            config,
            sessions,
            detector,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    use routes::*;

    let upload_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/form", get(auth_form))
        .route("/api/register", post(register_user))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session_info))
        .route(
            "/api/upload",
            post(upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/detect", post(detect_video))
        .route("/api/stats", get(get_stats))
        .route("/api/history/daily", get(get_daily_distribution))
        .with_state(state)
}
