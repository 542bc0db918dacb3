//! Shared setup for the SQLite integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, EntityTrait, PaginatorTrait, Set,
};

use account_service_lib::config::AccountServiceConfig;
use account_service_lib::infra::{
    Database, Persistence, TransactionContext, TxFuture, UnitOfWork,
};
use account_service_lib::repository::entities::{
    message, notification, pet_profile, pet_walk, service_provider, service_request,
    user_comment, user_favorite, user_request,
};
use account_service_lib::repository::{
    MessageRepository, NotificationRepository, StatsRepository, UserRepository, UserStore,
};
use account_service_lib::service::{
    AccountManager, AccountService, CredentialStore, LogMailer, MessageManager,
};
use common::{AppResult, DatabaseConfig};
use domain::{AuthProvider, NewUser, ResetToken, User};

/// Fresh in-memory database with every migration applied.
///
/// A single pooled connection keeps the in-memory database alive for the
/// whole test and makes the foreign key pragma apply to every statement.
pub async fn setup_db() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    Database::connect(&config)
        .await
        .expect("sqlite database should connect and migrate")
}

pub fn test_config() -> AccountServiceConfig {
    AccountServiceConfig::default()
}

pub fn accounts(db: &Database) -> AccountManager<Persistence> {
    AccountManager::new(
        Arc::new(Persistence::new(db.get_connection())),
        Arc::new(LogMailer::new(None)),
        CredentialStore::new(Duration::hours(1)),
    )
}

pub fn messages(db: &Database) -> MessageManager<Persistence> {
    MessageManager::new(Arc::new(Persistence::new(db.get_connection())))
}

pub fn users(db: &Database) -> UserStore {
    UserStore::new(db.get_connection())
}

pub async fn seed_user(db: &Database, email: &str, slug: &str) -> User {
    users(db)
        .create(NewUser {
            external_id: None,
            email: email.to_string(),
            password_hash: None,
            display_name: slug.replace('_', " "),
            slug: slug.to_string(),
            photo_url: None,
            provider: AuthProvider::Local,
        })
        .await
        .expect("user should insert")
}

pub async fn seed_job(conn: &DatabaseConnection, owner_id: i32) -> i32 {
    user_request::ActiveModel {
        id: NotSet,
        user_id: Set(owner_id),
        title: Set("Dog walking".to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("user request should insert")
    .id
}

pub async fn seed_message(
    conn: &DatabaseConnection,
    sender_id: i32,
    receiver_id: i32,
    job_id: i32,
) -> i32 {
    message::ActiveModel {
        id: NotSet,
        sender_id: Set(sender_id),
        receiver_id: Set(receiver_id),
        job_id: Set(job_id),
        content: Set("Is Friday fine?".to_string()),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("message should insert")
    .id
}

pub async fn seed_pet(conn: &DatabaseConnection, owner_id: i32) -> i32 {
    pet_profile::ActiveModel {
        id: NotSet,
        user_id: Set(owner_id),
        name: Set("Max".to_string()),
        species: Set(Some("dog".to_string())),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("pet profile should insert")
    .id
}

pub async fn seed_service_request(conn: &DatabaseConnection, pet_id: i32) -> i32 {
    service_request::ActiveModel {
        id: NotSet,
        pet_profile_id: Set(pet_id),
        service_type: Set("walking".to_string()),
        status: Set("pending".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("service request should insert")
    .id
}

pub async fn seed_notification(
    conn: &DatabaseConnection,
    owner_id: i32,
    related_user_id: Option<i32>,
    related_job_id: Option<i32>,
) -> i32 {
    notification::ActiveModel {
        id: NotSet,
        user_id: Set(owner_id),
        kind: Set("message".to_string()),
        title: Set("New message".to_string()),
        message: Set("You have a new message".to_string()),
        related_user_id: Set(related_user_id),
        related_job_id: Set(related_job_id),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("notification should insert")
    .id
}

pub async fn seed_favorite(conn: &DatabaseConnection, owner_id: i32, target: Option<i32>) -> i32 {
    seed_follow(conn, owner_id, target, "Favourite sitter", "caregiver").await
}

pub async fn seed_follow(
    conn: &DatabaseConnection,
    owner_id: i32,
    target: Option<i32>,
    title: &str,
    kind: &str,
) -> i32 {
    user_favorite::ActiveModel {
        id: NotSet,
        user_id: Set(owner_id),
        target_user_id: Set(target),
        title: Set(title.to_string()),
        kind: Set(kind.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("favorite should insert")
    .id
}

pub async fn seed_comment(conn: &DatabaseConnection, author_id: i32) -> i32 {
    seed_review(conn, author_id, None).await
}

pub async fn seed_review(conn: &DatabaseConnection, author_id: i32, card_id: Option<&str>) -> i32 {
    user_comment::ActiveModel {
        id: NotSet,
        user_id: Set(author_id),
        content: Set("Great with cats".to_string()),
        rating: Set(Some(5)),
        card_id: Set(card_id.map(str::to_string)),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("comment should insert")
    .id
}

pub async fn seed_pet_walk(conn: &DatabaseConnection, walker_id: i32) -> i32 {
    pet_walk::ActiveModel {
        id: NotSet,
        user_id: Set(walker_id),
        duration_seconds: Set(1800),
        distance_km: Set(2.4),
        path_json: Set("[]".to_string()),
        pets_json: Set("[\"Max\"]".to_string()),
        date: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("pet walk should insert")
    .id
}

pub async fn seed_provider(conn: &DatabaseConnection, owner_id: i32) -> i32 {
    service_provider::ActiveModel {
        id: NotSet,
        user_id: Set(owner_id),
        service_type: Set("boarding".to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .expect("service provider should insert")
    .id
}

pub async fn count<E>(conn: &DatabaseConnection) -> u64
where
    E: EntityTrait,
    E::Model: Sync,
{
    E::find().count(conn).await.expect("count should succeed")
}

// =============================================================================
// Interleaving writers
// =============================================================================

/// SQLite user store that replays another writer's work at chosen points.
pub struct ScriptedUsers {
    inner: UserStore,
    /// Upcoming slug lookups that report free, as if read before a
    /// concurrent insert committed
    stale_slug_lookups: AtomicUsize,
    /// Reset committed right before the next profile or login write
    pending_reset: Mutex<Option<(AccountManager<Persistence>, String, String)>>,
}

impl ScriptedUsers {
    pub fn new(db: &Database) -> Self {
        Self {
            inner: users(db),
            stale_slug_lookups: AtomicUsize::new(0),
            pending_reset: Mutex::new(None),
        }
    }

    pub fn with_stale_slug_lookups(db: &Database, lookups: usize) -> Self {
        let scripted = Self::new(db);
        scripted.stale_slug_lookups.store(lookups, Ordering::SeqCst);
        scripted
    }

    pub fn resetting_before_write(db: &Database, code: &str, new_password: &str) -> Self {
        let scripted = Self::new(db);
        *scripted.pending_reset.lock().unwrap() =
            Some((accounts(db), code.to_string(), new_password.to_string()));
        scripted
    }

    async fn run_pending_reset(&self) {
        let pending = self.pending_reset.lock().unwrap().take();
        if let Some((resetter, code, password)) = pending {
            resetter
                .confirm_password_reset(code, password)
                .await
                .expect("interleaved reset should succeed");
        }
    }

    fn take_stale_lookup(&self) -> bool {
        self.stale_slug_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl UserRepository for ScriptedUsers {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        self.inner.find_by_external_id(external_id).await
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<User>> {
        self.inner.find_by_slug(slug).await
    }

    async fn find_by_reset_token(&self, code: &str) -> AppResult<Vec<User>> {
        self.inner.find_by_reset_token(code).await
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        if self.take_stale_lookup() {
            return Ok(false);
        }
        self.inner.slug_exists(slug).await
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        self.inner.create(new_user).await
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        self.run_pending_reset().await;
        self.inner.save(user).await
    }

    async fn record_login(&self, id: i32, now: DateTime<Utc>) -> AppResult<()> {
        self.run_pending_reset().await;
        self.inner.record_login(id, now).await
    }

    async fn store_reset_token(
        &self,
        id: i32,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.inner.store_reset_token(id, token, now).await
    }

    async fn consume_reset_token(
        &self,
        id: i32,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.inner
            .consume_reset_token(id, code, password_hash, now)
            .await
    }
}

/// Persistence whose pooled user repository is a [`ScriptedUsers`].
pub struct ScriptedUnitOfWork {
    inner: Persistence,
    users: Arc<ScriptedUsers>,
}

#[async_trait]
impl UnitOfWork for ScriptedUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn messages(&self) -> Arc<dyn MessageRepository> {
        self.inner.messages()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.inner.notifications()
    }

    fn stats(&self) -> Arc<dyn StatsRepository> {
        self.inner.stats()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.inner.transaction(f).await
    }
}

pub fn scripted_accounts(db: &Database, users: ScriptedUsers) -> AccountManager<ScriptedUnitOfWork> {
    AccountManager::new(
        Arc::new(ScriptedUnitOfWork {
            inner: Persistence::new(db.get_connection()),
            users: Arc::new(users),
        }),
        Arc::new(LogMailer::new(None)),
        CredentialStore::new(Duration::hours(1)),
    )
}
