//! Password reset mail dispatch.
//!
//! SMTP delivery is not part of this service. The default dispatcher logs
//! the message so the code can be picked up from the service logs in
//! development.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const DEFAULT_FROM: &str = "noreply@zoozy.app";

/// Mail dispatcher trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a reset code. Returns whether the dispatcher accepted the mail.
    async fn send_password_reset_code(&self, email: &str, code: &str, display_name: &str)
        -> bool;
}

/// Mailer that writes outgoing mail to the log instead of sending it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: Option<String>) -> Self {
        Self {
            from: from.unwrap_or_else(|| DEFAULT_FROM.to_string()),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset_code(
        &self,
        email: &str,
        code: &str,
        display_name: &str,
    ) -> bool {
        tracing::warn!("SMTP not configured - logging email instead of sending");
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: Your password reset code\n\
             Body:\nHello {}, your password reset code is {}.\n\
             ========================",
            self.from,
            email,
            display_name,
            code
        );
        true
    }
}
