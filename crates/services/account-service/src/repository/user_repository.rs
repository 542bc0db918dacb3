//! User repository implementation.
//!
//! Queries are written once against any [`ConnectionTrait`] and shared by the
//! pooled [`UserStore`] and the transaction-bound repository handed out by
//! the unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{AuthProvider, NewUser, ResetToken, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Find user by email, ignoring case
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by federated identity id
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>>;

    /// Find user by public slug
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<User>>;

    /// Users currently holding `code` as their reset token, live or expired
    async fn find_by_reset_token(&self, code: &str) -> AppResult<Vec<User>>;

    /// Whether any user owns `slug`
    async fn slug_exists(&self, slug: &str) -> AppResult<bool>;

    /// Insert a new user. A slug collision surfaces as `AppError::SlugTaken`.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Persist the profile, identity and agreement fields of `user`.
    ///
    /// Password hash and reset token are never written from here.
    async fn save(&self, user: &User) -> AppResult<User>;

    /// Stamp a successful login without rewriting the rest of the row
    async fn record_login(&self, id: i32, now: DateTime<Utc>) -> AppResult<()>;

    /// Store `token` as the only reset code of `id`
    async fn store_reset_token(
        &self,
        id: i32,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Replace the password of `id` if it still holds reset `code`.
    ///
    /// Clears the token, switches the account to local sign-in and touches
    /// `updated_at` in the same statement. Returns whether a row changed.
    async fn consume_reset_token(
        &self,
        id: i32,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;
}

/// Concrete implementation of UserRepository over the connection pool
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        find_by_id(&self.db, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_by_email(&self.db, email).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        find_by_external_id(&self.db, external_id).await
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<User>> {
        find_by_slug(&self.db, slug).await
    }

    async fn find_by_reset_token(&self, code: &str) -> AppResult<Vec<User>> {
        find_by_reset_token(&self.db, code).await
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        Ok(find_by_slug(&self.db, slug).await?.is_some())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        create(&self.db, new_user).await
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        save(&self.db, user).await
    }

    async fn record_login(&self, id: i32, now: DateTime<Utc>) -> AppResult<()> {
        record_login(&self.db, id, now).await
    }

    async fn store_reset_token(
        &self,
        id: i32,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        store_reset_token(&self.db, id, token, now).await
    }

    async fn consume_reset_token(
        &self,
        id: i32,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        consume_reset_token(&self.db, id, code, password_hash, now).await
    }
}

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn find_by_id<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<Option<User>> {
    let result = UserEntity::find_by_id(id).one(conn).await?;
    Ok(result.map(User::from))
}

pub(crate) async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> AppResult<Option<User>> {
    let email = domain::normalize_email(email);
    let result = UserEntity::find()
        .filter(Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(email))
        .one(conn)
        .await?;

    Ok(result.map(User::from))
}

pub(crate) async fn find_by_external_id<C: ConnectionTrait>(
    conn: &C,
    external_id: &str,
) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(user::Column::ExternalId.eq(external_id))
        .one(conn)
        .await?;

    Ok(result.map(User::from))
}

pub(crate) async fn find_by_slug<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(user::Column::Slug.eq(slug))
        .one(conn)
        .await?;

    Ok(result.map(User::from))
}

pub(crate) async fn find_by_reset_token<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> AppResult<Vec<User>> {
    let models = UserEntity::find()
        .filter(user::Column::PasswordResetToken.eq(code))
        .all(conn)
        .await?;

    Ok(models.into_iter().map(User::from).collect())
}

pub(crate) async fn create<C: ConnectionTrait>(conn: &C, new_user: NewUser) -> AppResult<User> {
    let model = ActiveModel::for_new_user(new_user, Utc::now())
        .insert(conn)
        .await
        .map_err(write_error)?;

    Ok(User::from(model))
}

pub(crate) async fn save<C: ConnectionTrait>(conn: &C, user: &User) -> AppResult<User> {
    let model = ActiveModel::from(user)
        .update(conn)
        .await
        .map_err(write_error)?;

    Ok(User::from(model))
}

pub(crate) async fn record_login<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let result = UserEntity::update_many()
        .set(ActiveModel {
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(user::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

pub(crate) async fn store_reset_token<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    token: &ResetToken,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let result = UserEntity::update_many()
        .set(ActiveModel {
            password_reset_token: Set(Some(token.code().to_string())),
            password_reset_expires_at: Set(Some(token.expires_at())),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(user::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

pub(crate) async fn consume_reset_token<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    code: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let result = UserEntity::update_many()
        .set(ActiveModel {
            password_hash: Set(Some(password_hash.to_string())),
            password_reset_token: Set(None),
            password_reset_expires_at: Set(None),
            provider: Set(AuthProvider::Local.to_string()),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(user::Column::Id.eq(id))
        .filter(user::Column::PasswordResetToken.eq(code))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Translate unique-index violations on `users` into domain conflicts.
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("slug") {
                AppError::SlugTaken
            } else if detail.contains("email") {
                AppError::conflict("Email is already registered")
            } else {
                AppError::conflict("Account already exists")
            }
        }
        _ => match err {
            DbErr::RecordNotUpdated => AppError::NotFound("User"),
            other => AppError::Database(other),
        },
    }
}
