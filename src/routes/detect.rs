use std::path::PathBuf;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::constants::{DEEPFAKE_LABEL, REAL_LABEL};
use crate::db::{self, history};
use crate::detection::Detection;
use crate::error::{AppError, Result};
use crate::models::AggregateStats;
use crate::session::{AuthSession, SessionStore, UploadedVideo};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub file_name: String,
    pub label: &'static str,
    pub detection: Detection,
    pub message: String,
    pub stats: AggregateStats,
}

/// Classify the video and record the outcome in stats and history
async fn run_detection(
    state: &AppState,
    auth: &AuthSession,
    path: PathBuf,
) -> Result<(Detection, AggregateStats)> {
    let detection = state.detector.detect(path).await?;

    let entry = history::new_entry(
        detection.is_fake(),
        Utc::now(),
        Some(&auth.username),
        Some(detection.probability),
    );
    let db = state.db.clone();
    let stats =
        tokio::task::spawn_blocking(move || db::record_prediction(&db, &entry)).await??;

    Ok((detection, stats))
}

/// A video taken out of its session for detection
///
/// Unless `finish` is called, dropping this puts the video back into the
/// session as `uploaded`. That covers failed detections and requests that
/// are cancelled mid-flight.
struct InFlight {
    sessions: SessionStore,
    key: String,
    video: Option<UploadedVideo>,
}

impl InFlight {
    /// Show the result and delete the temporary upload
    fn finish(mut self, detection: Detection) {
        if let Some(video) = self.video.take() {
            let file_name = video.file_name.clone();
            self.sessions
                .with_session(&self.key, move |s| s.workflow.finish_detection(file_name, detection));
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(video) = self.video.take() {
            tracing::debug!("Returning {} to uploaded", video.file_name);
            // The session may have ended meanwhile; then the video is simply dropped
            self.sessions
                .with_session(&self.key, move |s| s.workflow.fail_detection(video));
        }
    }
}

/// Run deepfake detection on the caller's uploaded video
///
/// Moves the workflow `uploaded -> detecting`. On success the result is
/// shown and the temporary video deleted; on failure, or if the request is
/// dropped, the video stays uploaded so the user can retry.
pub async fn detect_video(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<DetectResponse>> {
    let video = state
        .sessions
        .with_session(&auth.key, |s| s.workflow.begin_detection())
        .ok_or(AppError::Unauthorized)??;

    tracing::info!("Detection started for {}: {}", auth.username, video.file_name);

    let file_name = video.file_name.clone();
    let path = video.path().to_path_buf();
    let in_flight = InFlight {
        sessions: state.sessions.clone(),
        key: auth.key.clone(),
        video: Some(video),
    };

    let (detection, stats) = match run_detection(&state, &auth, path).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Detection failed for {}: {}", auth.username, e);
            drop(in_flight);
            return Err(e);
        }
    };
    in_flight.finish(detection);

    let label = if detection.is_fake() {
        DEEPFAKE_LABEL
    } else {
        REAL_LABEL
    };

    Ok(Json(DetectResponse {
        file_name,
        label,
        detection,
        message: format!(
            "Prediction: {} (Confidence: {:.2}%)",
            label, detection.fake_probability_percent
        ),
        stats,
    }))
}
