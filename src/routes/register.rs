use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::ERR_INVALID_USERNAME;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Register a new user
///
/// Checks run in order: terms accepted, username format, username free,
/// passwords match, password strength. Only the Argon2id hash of the password
/// is stored.
///
/// Returns 409 Conflict if the username already exists.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if !payload.accept_terms {
        return Err(AppError::TermsNotAccepted);
    }

    let username = payload.username.trim().to_string();
    if !User::validate_username(&username) {
        tracing::warn!("Invalid username format at registration");
        return Err(AppError::InvalidInput(ERR_INVALID_USERNAME.to_string()));
    }

    let db = state.db.clone();
    let RegisterRequest {
        password,
        confirm_password,
        ..
    } = payload;

    tokio::task::spawn_blocking(move || {
        if users::exists(&db, &username)? {
            tracing::info!("Registration rejected, user exists: {}", username);
            return Err(AppError::UserAlreadyExists);
        }
        if password != confirm_password {
            return Err(AppError::PasswordMismatch);
        }
        users::register(&db, &username, &password, Utc::now().timestamp())
    })
    .await??;

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful! You can now log in.",
    }))
}
