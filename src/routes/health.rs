use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Reports database connectivity and the loaded classifier's input shape.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    // Check database connectivity by attempting a read transaction
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || match db.begin_read() {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    })
    .await
    .unwrap_or("error");

    let shape = state.detector.input_shape();

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "classifier": {
            "frames": shape.frames,
            "height": shape.height,
            "width": shape.width,
            "threshold": state.detector.threshold(),
        },
        "activeSessions": state.sessions.len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
