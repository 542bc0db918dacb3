//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and owns the transaction lifecycle: a
//! transaction closure's `Ok` commits, every `Err` path rolls back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, TransactionTrait,
};

use crate::repository::user_repository as user_queries;
use crate::repository::{
    MessageRepository, MessageStore, NotificationRepository, NotificationStore, StatsRepository,
    StatsStore, UserRepository, UserStore,
};
use common::{AppError, AppResult};
use domain::{NewUser, ResetToken, User};

/// Boxed future returned by a transaction closure.
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly due to the generic `transaction` method; unit
/// tests provide a hand-written implementation over repository mocks.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get message repository
    fn messages(&self) -> Arc<dyn MessageRepository>;

    /// Get notification repository
    fn notifications(&self) -> Arc<dyn NotificationRepository>;

    /// Get profile stats read model
    fn stats(&self) -> Arc<dyn StatsRepository>;

    /// Execute a closure within a transaction.
    ///
    /// The transaction is committed on success or rolled back on error.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
///
/// Everything done through this context is part of the same database
/// transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get user repository for this transaction
    pub fn users(&self) -> TxUserRepository<'a> {
        TxUserRepository { txn: self.txn }
    }

    /// Raw connection for statements built outside the repositories
    pub fn connection(&self) -> &'a DatabaseTransaction {
        self.txn
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    message_repo: Arc<MessageStore>,
    notification_repo: Arc<NotificationStore>,
    stats_repo: Arc<StatsStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            message_repo: Arc::new(MessageStore::new(db.clone())),
            notification_repo: Arc::new(NotificationStore::new(db.clone())),
            stats_repo: Arc::new(StatsStore::new(db.clone())),
            db,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn messages(&self) -> Arc<dyn MessageRepository> {
        self.message_repo.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notification_repo.clone()
    }

    fn stats(&self) -> Arc<dyn StatsRepository> {
        self.stats_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        // SQLite only supports database-wide isolation settings
        let (isolation, access) = match self.db.get_database_backend() {
            DbBackend::Postgres => (
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            ),
            _ => (None, None),
        };

        let txn = self.db.begin_with_config(isolation, access).await?;

        match f(TransactionContext::new(&txn)).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware user repository.
///
/// Borrows the transaction so it cannot outlive it.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

#[async_trait]
impl UserRepository for TxUserRepository<'_> {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        user_queries::find_by_id(self.txn, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        user_queries::find_by_email(self.txn, email).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        user_queries::find_by_external_id(self.txn, external_id).await
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<User>> {
        user_queries::find_by_slug(self.txn, slug).await
    }

    async fn find_by_reset_token(&self, code: &str) -> AppResult<Vec<User>> {
        user_queries::find_by_reset_token(self.txn, code).await
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        Ok(user_queries::find_by_slug(self.txn, slug).await?.is_some())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        user_queries::create(self.txn, new_user).await
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        user_queries::save(self.txn, user).await
    }

    async fn record_login(&self, id: i32, now: DateTime<Utc>) -> AppResult<()> {
        user_queries::record_login(self.txn, id, now).await
    }

    async fn store_reset_token(
        &self,
        id: i32,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        user_queries::store_reset_token(self.txn, id, token, now).await
    }

    async fn consume_reset_token(
        &self,
        id: i32,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        user_queries::consume_reset_token(self.txn, id, code, password_hash, now).await
    }
}

/// Simpler API for executing transactional operations.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
