//! Per-login sessions and the upload/detect workflow they carry
//!
//! Sessions live only in memory. A bearer token is handed out at login and
//! resolved on every request by the `AuthSession` extractor; the store keys
//! sessions by the token's SHA-256 digest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use tempfile::TempDir;

use crate::detection::Detection;
use crate::error::{AppError, Result};
use crate::routes::validation::bearer_token;
use crate::security::{generate_session_token, session_key};
use crate::AppState;

/// A video saved for the current session
///
/// The file lives in its own temporary directory, removed when this value
/// is dropped.
#[derive(Debug)]
pub struct UploadedVideo {
    pub file_name: String,
    pub size_bytes: u64,
    path: PathBuf,
    _dir: TempDir,
}

impl UploadedVideo {
    pub fn new(file_name: String, size_bytes: u64, path: PathBuf, dir: TempDir) -> Self {
        Self {
            file_name,
            size_bytes,
            path,
            _dir: dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Where an authenticated user is in the upload/detect flow
#[derive(Debug, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploaded(UploadedVideo),
    Detecting {
        file_name: String,
    },
    ResultShown {
        file_name: String,
        detection: Detection,
    },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Uploaded(_) => "uploaded",
            WorkflowState::Detecting { .. } => "detecting",
            WorkflowState::ResultShown { .. } => "result_shown",
        }
    }

    /// Accept a new upload, replacing any previous video or result
    pub fn upload(&mut self, video: UploadedVideo) -> Result<()> {
        if matches!(self, WorkflowState::Detecting { .. }) {
            return Err(AppError::WorkflowConflict("Detection already in progress"));
        }
        *self = WorkflowState::Uploaded(video);
        Ok(())
    }

    /// Move `uploaded -> detecting`, handing the video to the caller
    pub fn begin_detection(&mut self) -> Result<UploadedVideo> {
        match std::mem::take(self) {
            WorkflowState::Uploaded(video) => {
                *self = WorkflowState::Detecting {
                    file_name: video.file_name.clone(),
                };
                Ok(video)
            }
            other => {
                let err = match other {
                    WorkflowState::Detecting { .. } => "Detection already in progress",
                    _ => "Upload a video before running detection",
                };
                *self = other;
                Err(AppError::WorkflowConflict(err))
            }
        }
    }

    /// Move `detecting -> result shown`
    pub fn finish_detection(&mut self, file_name: String, detection: Detection) {
        *self = WorkflowState::ResultShown {
            file_name,
            detection,
        };
    }

    /// Move `detecting -> uploaded`, giving the video back for another try
    pub fn fail_detection(&mut self, video: UploadedVideo) {
        *self = WorkflowState::Uploaded(video);
    }
}

/// Serializable view of a session's workflow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowView {
    pub state: &'static str,
    pub file_name: Option<String>,
    pub size_bytes: Option<u64>,
    pub detection: Option<Detection>,
}

impl From<&WorkflowState> for WorkflowView {
    fn from(state: &WorkflowState) -> Self {
        let (file_name, size_bytes, detection) = match state {
            WorkflowState::Idle => (None, None, None),
            WorkflowState::Uploaded(video) => {
                (Some(video.file_name.clone()), Some(video.size_bytes), None)
            }
            WorkflowState::Detecting { file_name } => (Some(file_name.clone()), None, None),
            WorkflowState::ResultShown {
                file_name,
                detection,
            } => (Some(file_name.clone()), None, Some(*detection)),
        };
        WorkflowView {
            state: state.name(),
            file_name,
            size_bytes,
            detection,
        }
    }
}

/// One logged-in browser session
#[derive(Debug)]
pub struct Session {
    pub username: String,
    pub created_at: i64,
    pub last_seen: i64,
    pub workflow: WorkflowState,
}

/// In-memory session table shared across handlers
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
    ttl_secs: i64,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl_secs,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a session for `username`; returns the bearer token
    pub fn create(&self, username: &str, now: i64) -> String {
        self.purge_expired(now);

        let token = generate_session_token();
        let session = Session {
            username: username.to_string(),
            created_at: now,
            last_seen: now,
            workflow: WorkflowState::Idle,
        };
        self.lock().insert(session_key(&token), session);
        token
    }

    /// Look up a live session by token digest, refreshing its activity time
    ///
    /// Every lookup first drops all sessions idle past the TTL, deleting
    /// their uploads, so an expired session is never returned.
    pub fn resolve(&self, key: &str, now: i64) -> Option<String> {
        self.purge_expired(now);

        let mut sessions = self.lock();
        let session = sessions.get_mut(key)?;
        session.last_seen = now;
        Some(session.username.clone())
    }

    /// End a session, discarding its workflow state
    pub fn remove(&self, key: &str) -> Option<Session> {
        self.lock().remove(key)
    }

    /// Run `f` against a session while holding the table lock
    pub fn with_session<R>(&self, key: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.lock().get_mut(key).map(f)
    }

    /// Drop sessions idle for longer than the TTL; returns how many were removed
    pub fn purge_expired(&self, now: i64) -> usize {
        let expired: Vec<Session> = {
            let mut sessions = self.lock();
            let keys: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| now - s.last_seen > self.ttl_secs)
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter().filter_map(|k| sessions.remove(k)).collect()
        };

        if !expired.is_empty() {
            tracing::info!("Purged {} expired sessions", expired.len());
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Authenticated caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session table key (token digest)
    pub key: String,
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let key = session_key(token);
        let now = chrono::Utc::now().timestamp();

        let username = state
            .sessions
            .resolve(&key, now)
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession { key, username })
    }
}
