//! Credential store - password hashing and the reset token lifecycle.

use chrono::{DateTime, Duration, Utc};

use common::{AppError, AppResult};
use domain::{Password, ResetToken, User};

use crate::infra::UnitOfWork;
use crate::repository::UserRepository;
use crate::with_transaction;

/// Draws before giving up on finding a code no other user holds live
const RESET_CODE_DRAWS: usize = 10;

/// Password and reset-token operations shared by the account flows.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    reset_ttl: Duration,
}

impl CredentialStore {
    pub fn new(reset_ttl: Duration) -> Self {
        Self { reset_ttl }
    }

    /// Hash a (trimmed) password after checking its minimum length.
    pub fn hash(&self, plain_text: &str) -> AppResult<String> {
        Ok(Password::new(plain_text)?.into_string())
    }

    /// Whether `plain_text` matches the stored hash. A missing or malformed
    /// hash never matches.
    pub fn verify(&self, plain_text: &str, hash: Option<&str>) -> bool {
        hash.is_some_and(|hash| Password::from_hash(hash).verify(plain_text))
    }

    /// Issue a reset code that no other user currently holds live.
    pub async fn issue_reset_token(
        &self,
        users: &dyn UserRepository,
        now: DateTime<Utc>,
    ) -> AppResult<ResetToken> {
        for _ in 0..RESET_CODE_DRAWS {
            let token = ResetToken::issue(now, self.reset_ttl);
            let holders = users.find_by_reset_token(token.code()).await?;
            if !holders
                .iter()
                .any(|holder| holder.reset_token_matches(token.code(), now))
            {
                return Ok(token);
            }
        }
        Err(AppError::internal("Could not draw an unused reset code"))
    }

    /// Set a new password using a live reset code.
    ///
    /// Validation of the new password happens first. The matching user is
    /// then updated with one conditional statement inside a transaction, so
    /// a code can only ever be consumed once.
    pub async fn consume_reset_token<U: UnitOfWork>(
        &self,
        uow: &U,
        code: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let code = code.trim().to_string();
        let password_hash = self.hash(new_password)?;
        if code.is_empty() {
            return Err(AppError::InvalidOrExpiredToken);
        }

        with_transaction!(uow, |ctx| {
            let users = ctx.users();
            let holder = users
                .find_by_reset_token(&code)
                .await?
                .into_iter()
                .find(|user| user.reset_token_matches(&code, now))
                .ok_or(AppError::InvalidOrExpiredToken)?;

            if !users
                .consume_reset_token(holder.id, &code, &password_hash, now)
                .await?
            {
                return Err(AppError::InvalidOrExpiredToken);
            }

            users.find_by_id(holder.id).await?.ok_or(AppError::InvalidOrExpiredToken)
        })
    }
}
