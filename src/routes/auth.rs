use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::users;
use crate::error::{AppError, Result};
use crate::session::{AuthSession, WorkflowView};
use crate::AppState;

/// Which of the two account forms is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// One input of an account form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
}

/// Description of the form a client should render for a mode
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthForm {
    pub mode: AuthMode,
    pub title: &'static str,
    pub submit_label: &'static str,
    pub action: &'static str,
    pub fields: Vec<FormField>,
}

impl AuthMode {
    pub fn form(self) -> AuthForm {
        let field = |name, label, kind| FormField { name, label, kind };
        match self {
            AuthMode::Login => AuthForm {
                mode: self,
                title: "Login to your account",
                submit_label: "Log In",
                action: "/api/login",
                fields: vec![
                    field("username", "User ID", "text"),
                    field("password", "Password", "password"),
                ],
            },
            AuthMode::Register => AuthForm {
                mode: self,
                title: "Register a new account",
                submit_label: "Register",
                action: "/api/register",
                fields: vec![
                    field("username", "User ID", "text"),
                    field("password", "Password", "password"),
                    field("confirmPassword", "Confirm Password", "password"),
                    field("acceptTerms", "I agree to the terms & conditions", "checkbox"),
                ],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthFormQuery {
    #[serde(default)]
    pub mode: AuthMode,
}

/// Form description for the login/register toggle
///
/// GET /api/auth/form?mode=login|register
pub async fn auth_form(Query(query): Query<AuthFormQuery>) -> Json<AuthForm> {
    Json(query.mode.form())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub message: String,
}

/// Verify credentials and open a session
///
/// The returned token must be sent as `Authorization: Bearer <token>`.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let db = state.db.clone();
    let password = payload.password;
    let user = tokio::task::spawn_blocking(move || {
        users::authenticate(&db, &username, &password, Utc::now().timestamp())
    })
    .await??;

    let token = state.sessions.create(&user.username, Utc::now().timestamp());
    tracing::info!("User logged in: {}", user.username);

    Ok(Json(LoginResponse {
        token,
        message: format!("Welcome, {}!", user.username),
        username: user.username,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// End the caller's session, discarding any uploaded video
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Json<LogoutResponse> {
    let removed = state.sessions.remove(&auth.key);
    tracing::info!("User logged out: {}", auth.username);

    // Dropping the session deletes its temporary upload
    drop(removed);

    Json(LogoutResponse { success: true })
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub workflow: WorkflowView,
}

/// Current user and workflow state
pub async fn session_info(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<SessionResponse>> {
    let workflow = state
        .sessions
        .with_session(&auth.key, |s| WorkflowView::from(&s.workflow))
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(SessionResponse {
        username: auth.username,
        workflow,
    }))
}
