//! Redis cache used for request rate limiting.

use common::{AppResult, CacheConfig};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// Redis cache wrapper with a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &CacheConfig) -> Result<Self, RedisError> {
        let client = Client::open(config.url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    /// Count a request against a fixed window.
    ///
    /// Returns the request count within the current window and whether it
    /// is still within `max_requests`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", RATE_LIMIT_PREFIX, identifier);
        let mut conn = self.connection.clone();

        let count: u64 = conn.incr(&key, 1u64).await?;
        if count == 1 {
            // First request opens the window
            let _: () = conn.expire(&key, window_seconds as i64).await?;
        }

        Ok((count, count <= max_requests))
    }

    /// Check Redis connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
