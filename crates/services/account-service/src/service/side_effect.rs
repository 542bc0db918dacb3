//! Bounded fire-and-forget side effects.
//!
//! Mail dispatch and notification inserts must never fail the operation
//! that triggered them. Each attempt is bounded by [`SIDE_EFFECT_TIMEOUT`]
//! and its outcome is reported as a [`Delivery`] rather than an error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;

/// Upper bound on a single side-effect attempt
pub const SIDE_EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a best-effort side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Delivered,
    /// Not attempted because it did not apply
    Skipped,
    /// Attempted and failed or timed out; already logged
    Failed,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Run `effect` with the default timeout, logging any failure.
pub async fn best_effort<F, T, E>(what: &'static str, effect: F) -> Delivery
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    best_effort_within(what, SIDE_EFFECT_TIMEOUT, effect).await
}

pub async fn best_effort_within<F, T, E>(what: &'static str, limit: Duration, effect: F) -> Delivery
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, effect).await {
        Ok(Ok(_)) => Delivery::Delivered,
        Ok(Err(e)) => {
            tracing::warn!(side_effect = what, error = %e, "Side effect failed");
            Delivery::Failed
        }
        Err(_) => {
            tracing::warn!(
                side_effect = what,
                timeout_ms = limit.as_millis() as u64,
                "Side effect timed out"
            );
            Delivery::Failed
        }
    }
}
