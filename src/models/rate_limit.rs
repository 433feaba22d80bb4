use serde::{Deserialize, Serialize};

use crate::constants::{LOGIN_WINDOW_SECS, MAX_FAILED_LOGINS_PER_WINDOW};
use crate::error::{AppError, Result};

/// Failed login tracking per username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginThrottle {
    /// Failed attempts in the current window
    pub failed_attempts: u32,
    /// Unix timestamp of the last failed attempt
    pub last_failure_at: Option<i64>,
    /// Unix timestamp when the window resets
    pub window_reset_at: i64,
}

impl LoginThrottle {
    /// Create a new record with a fresh window
    pub fn new(now: i64) -> Self {
        Self {
            failed_attempts: 0,
            last_failure_at: None,
            window_reset_at: now + LOGIN_WINDOW_SECS,
        }
    }

    /// Check whether another login attempt is allowed right now
    /// Returns Ok(()) if allowed, Err(RateLimitExceeded) if not
    pub fn check(&mut self, now: i64) -> Result<()> {
        if now >= self.window_reset_at {
            self.failed_attempts = 0;
            self.window_reset_at = now + LOGIN_WINDOW_SECS;
        }

        if self.failed_attempts >= MAX_FAILED_LOGINS_PER_WINDOW {
            tracing::warn!(
                "Login throttled: {}/{} failed attempts",
                self.failed_attempts,
                MAX_FAILED_LOGINS_PER_WINDOW
            );
            return Err(AppError::RateLimitExceeded);
        }

        Ok(())
    }

    /// Count a failed attempt
    pub fn record_failure(&mut self, now: i64) {
        if now >= self.window_reset_at {
            self.failed_attempts = 0;
            self.window_reset_at = now + LOGIN_WINDOW_SECS;
        }
        self.failed_attempts += 1;
        self.last_failure_at = Some(now);
    }
}
