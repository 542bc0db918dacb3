//! Application state - Dependency injection container.

use std::sync::Arc;

use chrono::Duration;

use common::RateLimitConfig;

use crate::config::AccountServiceConfig;
use crate::infra::{Cache, Database, Persistence};
use crate::service::{
    AccountManager, AccountService, CredentialStore, LogMailer, Mailer, MessageManager,
    MessageService,
};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountService>,
    pub messages: Arc<dyn MessageService>,
    pub database: Arc<Database>,
    /// Present only when Redis is configured
    pub cache: Option<Cache>,
    pub auth_rate_limit: RateLimitConfig,
}

impl AppState {
    /// Wire the services over one unit of work, using the log mailer.
    pub fn from_config(
        database: Arc<Database>,
        cache: Option<Cache>,
        config: &AccountServiceConfig,
    ) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.reset.mail_from.clone()));
        Self::with_mailer(database, cache, config, mailer)
    }

    pub fn with_mailer(
        database: Arc<Database>,
        cache: Option<Cache>,
        config: &AccountServiceConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(database.get_connection()));
        let credentials =
            CredentialStore::new(Duration::minutes(config.reset.token_ttl_minutes));

        Self {
            accounts: Arc::new(AccountManager::new(uow.clone(), mailer, credentials)),
            messages: Arc::new(MessageManager::new(uow)),
            database,
            cache,
            auth_rate_limit: config.auth_rate_limit.clone(),
        }
    }
}
