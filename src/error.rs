use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::detection::classifier::ClassifierError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Weak password")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Terms not accepted")]
    TermsNotAccepted,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Unsupported video type")]
    UnsupportedVideoType,

    #[error("Workflow conflict: {0}")]
    WorkflowConflict(&'static str),

    #[error("Not enough frames for prediction: {found}/{required}")]
    InsufficientFrames { found: usize, required: usize },

    #[error("Video decode error: {0}")]
    VideoDecode(String),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message): (StatusCode, String) = match self {
            AppError::Database(ref e) => internal("Database", e),
            AppError::Transaction(ref e) => internal("Transaction", e),
            AppError::Table(ref e) => internal("Table", e),
            AppError::Storage(ref e) => internal("Storage", e),
            AppError::Commit(ref e) => internal("Commit", e),
            AppError::Serialization(ref e) => internal("Serialization", e),
            AppError::TaskJoin(ref e) => internal("Task join", e),
            AppError::Io(ref e) => internal("I/O", e),
            AppError::PasswordHash(ref e) => internal("Password hashing", e),
            AppError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "Username already exists.".to_string())
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password.".to_string(),
            ),
            AppError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                crate::constants::ERR_WEAK_PASSWORD.to_string(),
            ),
            AppError::PasswordMismatch => {
                (StatusCode::BAD_REQUEST, "Passwords do not match.".to_string())
            }
            AppError::TermsNotAccepted => (
                StatusCode::BAD_REQUEST,
                "You must agree to the terms & conditions.".to_string(),
            ),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Please log in first.".to_string())
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Video size exceeds maximum allowed".to_string(),
            ),
            AppError::UnsupportedVideoType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                crate::constants::ERR_UNSUPPORTED_VIDEO.to_string(),
            ),
            AppError::WorkflowConflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
            AppError::InsufficientFrames { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Not enough frames for prediction.".to_string(),
            ),
            AppError::VideoDecode(ref e) => {
                tracing::warn!("Video decode error: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Could not decode the uploaded video.".to_string(),
                )
            }
            AppError::Classifier(ref e) => {
                tracing::error!("Classifier error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Classifier failed to produce a prediction.".to_string(),
                )
            }
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts - try again later".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

fn internal(kind: &str, e: &dyn std::fmt::Debug) -> (StatusCode, String) {
    tracing::error!("{} error: {:?}", kind, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
