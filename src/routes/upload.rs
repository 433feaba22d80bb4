use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::constants::{ERR_MISSING_VIDEO, UPLOAD_FIELD_NAME};
use crate::error::{AppError, Result};
use crate::routes::validation::{display_file_name, video_extension};
use crate::session::{AuthSession, UploadedVideo};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    pub size_bytes: u64,
    pub state: &'static str,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidInput(e.body_text())
    }
}

/// Store an uploaded video for the caller's session
///
/// Expects a multipart body with a `video` file field. The file is written
/// to a fresh temporary directory owned by the session; a previous upload
/// is discarded.
///
/// # Limits
/// - Extension must be one of mp4/avi/mov
/// - Size is capped at `max_upload_bytes` (413 otherwise)
pub async fn upload_video(
    State(state): State<AppState>,
    auth: AuthSession,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let max_bytes = state.config.max_upload_bytes as u64;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput(ERR_MISSING_VIDEO.to_string()))?;
        let ext = video_extension(&original_name)?;

        let dir = tempfile::Builder::new().prefix("upload-").tempdir()?;
        let path = dir.path().join(format!("upload.{ext}"));
        let mut file = tokio::fs::File::create(&path).await?;

        let mut size_bytes = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            size_bytes += chunk.len() as u64;
            if size_bytes > max_bytes {
                tracing::warn!(
                    "Upload too large from user {}: over {} bytes",
                    auth.username,
                    max_bytes
                );
                return Err(AppError::PayloadTooLarge);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if size_bytes == 0 {
            return Err(AppError::InvalidInput("Uploaded video is empty".to_string()));
        }

        let file_name = display_file_name(&original_name);
        let video = UploadedVideo::new(file_name.clone(), size_bytes, path, dir);
        state
            .sessions
            .with_session(&auth.key, |s| s.workflow.upload(video))
            .ok_or(AppError::Unauthorized)??;

        tracing::info!(
            "Video uploaded by {}: {} ({} bytes)",
            auth.username,
            file_name,
            size_bytes
        );

        return Ok(Json(UploadResponse {
            file_name,
            size_bytes,
            state: "uploaded",
        }));
    }

    Err(AppError::InvalidInput(ERR_MISSING_VIDEO.to_string()))
}
