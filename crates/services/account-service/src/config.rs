//! Account service configuration.

use std::env;

use common::{CacheConfig, DatabaseConfig, RateLimitConfig, ResetConfig, ServiceConfig};

/// Account service configuration.
#[derive(Debug, Clone, Default)]
pub struct AccountServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    /// Redis is optional; without it `/auth` is not rate limited
    pub cache: Option<CacheConfig>,
    pub auth_rate_limit: RateLimitConfig,
    pub reset: ResetConfig,
}

impl AccountServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            service: ServiceConfig {
                host: env::var("ACCOUNT_SERVICE_HOST").unwrap_or(defaults.service.host),
                port: parse_var("ACCOUNT_SERVICE_PORT").unwrap_or(defaults.service.port),
                ..defaults.service
            },
            database: DatabaseConfig {
                url: env::var("ACCOUNT_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(defaults.database.min_connections),
            },
            cache: env::var("REDIS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(|url| CacheConfig { url }),
            auth_rate_limit: RateLimitConfig {
                max_requests: parse_var("RATE_LIMIT_AUTH_REQUESTS")
                    .unwrap_or(defaults.auth_rate_limit.max_requests),
                window_seconds: parse_var("RATE_LIMIT_AUTH_WINDOW_SECONDS")
                    .unwrap_or(defaults.auth_rate_limit.window_seconds),
                trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS")
                    .unwrap_or(defaults.auth_rate_limit.trust_proxy_headers),
            },
            reset: ResetConfig {
                token_ttl_minutes: parse_var("RESET_TOKEN_TTL_MINUTES")
                    .filter(|minutes: &i64| *minutes > 0)
                    .unwrap_or(defaults.reset.token_ttl_minutes),
                mail_from: env::var("SMTP_FROM").ok(),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
