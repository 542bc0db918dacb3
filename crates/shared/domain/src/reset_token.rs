//! Password reset token value object.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::constants::{RESET_CODE_MAX, RESET_CODE_MIN};

/// A short numeric reset code with an absolute expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    code: String,
    expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Issue a fresh 6-digit code valid for `ttl` from `now`.
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let code = rand::thread_rng().gen_range(RESET_CODE_MIN..=RESET_CODE_MAX);
        Self {
            code: code.to_string(),
            expires_at: now + ttl,
        }
    }

    /// Rebuild a token from stored fields.
    pub fn new(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            expires_at,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token accepts `presented` only on an exact match strictly before expiry.
    pub fn accepts(&self, presented: &str, now: DateTime<Utc>) -> bool {
        self.code == presented && now < self.expires_at
    }
}
