//! Account lifecycle service.
//!
//! Registration, local and federated login, profile sync and edits,
//! password reset and account deletion. Every flow goes through the unit of
//! work so the storage guarantees (unique email and slug indexes,
//! transactions) back the checks made here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use validator::ValidateEmail;

use common::{AppError, AppResult, OptionExt};
use domain::{
    normalize_email, normalize_photo, AuthProvider, NewUser, User, UserStats, UserView,
};

use super::credential_store::CredentialStore;
use super::mailer::Mailer;
use super::side_effect::best_effort;
use super::slug_allocator::{create_with_slug, save_with_slug};
use crate::infra::UnitOfWork;
use crate::integrity::{self, plan_deletion, DeletionReport};
use crate::with_transaction;

const RESET_REQUESTED_MESSAGE: &str =
    "If the email is registered, a password reset code has been sent";

/// Response of the authentication flows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl AuthResponse {
    fn with_user(message: &str, user: User) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user: Some(user.into()),
        }
    }

    fn message(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user: None,
        }
    }
}

/// Identity reported by a federated provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FederatedProfile {
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// User-initiated profile edit. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a local account
    async fn register(
        &self,
        email: String,
        password: String,
        display_name: String,
    ) -> AppResult<AuthResponse>;

    /// Sign in with email and password
    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse>;

    /// Sign in through the federated provider, linking or creating the account
    async fn federated_login(&self, profile: FederatedProfile) -> AppResult<AuthResponse>;

    /// Upsert an account by its external identity id
    async fn sync_user(
        &self,
        profile: FederatedProfile,
        provider: AuthProvider,
    ) -> AppResult<UserView>;

    async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserView>;

    async fn get_user(&self, user_id: i32) -> AppResult<UserView>;

    async fn get_user_by_slug(&self, slug: &str) -> AppResult<UserView>;

    /// Follower, following and review counts of a user
    async fn get_user_stats(&self, user_id: i32) -> AppResult<UserStats>;

    async fn get_user_stats_by_slug(&self, slug: &str) -> AppResult<UserStats>;

    /// Issue a reset code. The response never reveals whether the email exists.
    async fn request_password_reset(&self, email: String) -> AppResult<AuthResponse>;

    /// Set a new password with a live reset code
    async fn confirm_password_reset(
        &self,
        token: String,
        new_password: String,
    ) -> AppResult<AuthResponse>;

    /// Delete the account together with every row referencing it
    async fn delete_account(&self, user_id: i32) -> AppResult<DeletionReport>;

    async fn update_agreements(
        &self,
        user_id: i32,
        terms_accepted: bool,
        privacy_accepted: bool,
    ) -> AppResult<UserView>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    credentials: CredentialStore,
}

impl<U: UnitOfWork> AccountManager<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn Mailer>, credentials: CredentialStore) -> Self {
        Self {
            uow,
            mailer,
            credentials,
        }
    }

    async fn find_user(&self, user_id: i32) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")
    }

    async fn find_user_by_slug(&self, slug: &str) -> AppResult<User> {
        self.uow
            .users()
            .find_by_slug(slug.trim())
            .await?
            .ok_or_not_found("User")
    }
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountManager<U> {
    async fn register(
        &self,
        email: String,
        password: String,
        display_name: String,
    ) -> AppResult<AuthResponse> {
        let email = normalize_email(&email);
        let display_name = display_name.trim().to_string();
        if email.is_empty() || password.trim().is_empty() || display_name.is_empty() {
            return Err(AppError::validation(
                "Email, password and display name are required",
            ));
        }
        if !email.validate_email() {
            return Err(AppError::validation("Invalid email address"));
        }
        let password_hash = self.credentials.hash(&password)?;

        let users = self.uow.users();
        if let Some(existing) = users.find_by_email(&email).await? {
            return Err(if existing.provider.is_federated() {
                AppError::conflict("This email is registered with Google sign-in")
            } else {
                AppError::conflict("Email is already registered")
            });
        }

        let user = create_with_slug(
            users.as_ref(),
            NewUser {
                external_id: None,
                email,
                password_hash: Some(password_hash),
                display_name,
                slug: String::new(),
                photo_url: None,
                provider: AuthProvider::Local,
            },
        )
        .await?;

        tracing::info!(user_id = user.id, slug = ?user.slug, "User registered");
        Ok(AuthResponse::with_user("Registration successful", user))
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse> {
        let users = self.uow.users();
        let mut user = users
            .find_by_email(&normalize_email(&email))
            .await?
            .ok_or_not_found("User")?;

        if !user.is_active {
            return Err(AppError::InactiveAccount);
        }
        if user.provider.is_federated() {
            return Err(AppError::WrongProvider);
        }
        if !self
            .credentials
            .verify(&password, user.password_hash.as_deref())
        {
            return Err(AppError::InvalidCredentials);
        }

        let now = Utc::now();
        users.record_login(user.id, now).await?;
        user.touch(now);

        tracing::info!(user_id = user.id, "User logged in");
        Ok(AuthResponse::with_user("Login successful", user))
    }

    async fn federated_login(&self, profile: FederatedProfile) -> AppResult<AuthResponse> {
        let external_id = profile.external_id.trim();
        let email = normalize_email(&profile.email);
        if external_id.is_empty() || email.is_empty() {
            return Err(AppError::validation("External id and email are required"));
        }

        let users = self.uow.users();
        let now = Utc::now();

        if let Some(mut user) = users.find_by_external_id(external_id).await? {
            if !user.is_active {
                return Err(AppError::InactiveAccount);
            }
            user.apply_federated_profile(&profile.display_name, profile.photo_url.as_deref());
            user.touch(now);
            let user = save_with_slug(users.as_ref(), &mut user).await?;
            return Ok(AuthResponse::with_user("Login successful", user));
        }

        if let Some(mut user) = users.find_by_email(&email).await? {
            if !user.is_active {
                return Err(AppError::InactiveAccount);
            }
            user.link_external_identity(external_id);
            user.apply_federated_profile(&profile.display_name, profile.photo_url.as_deref());
            user.touch(now);
            let user = save_with_slug(users.as_ref(), &mut user).await?;

            tracing::info!(user_id = user.id, "Federated identity linked to existing account");
            return Ok(AuthResponse::with_user("Login successful", user));
        }

        let display_name = federated_display_name(&profile.display_name, &email);
        let user = create_with_slug(
            users.as_ref(),
            NewUser {
                external_id: Some(external_id.to_string()),
                email,
                password_hash: None,
                display_name,
                slug: String::new(),
                photo_url: normalize_photo(profile.photo_url.as_deref()),
                provider: AuthProvider::Google,
            },
        )
        .await?;

        tracing::info!(user_id = user.id, "Federated account created");
        Ok(AuthResponse::with_user("Registration successful", user))
    }

    async fn sync_user(
        &self,
        profile: FederatedProfile,
        provider: AuthProvider,
    ) -> AppResult<UserView> {
        let external_id = profile.external_id.trim();
        let email = normalize_email(&profile.email);
        if external_id.is_empty() || email.is_empty() {
            return Err(AppError::validation("External id and email are required"));
        }

        let users = self.uow.users();
        let user = match users.find_by_external_id(external_id).await? {
            Some(mut user) => {
                user.email = email;
                user.provider = provider;
                user.apply_federated_profile(&profile.display_name, profile.photo_url.as_deref());
                user.touch(Utc::now());
                save_with_slug(users.as_ref(), &mut user).await?
            }
            None => {
                let display_name = federated_display_name(&profile.display_name, &email);
                create_with_slug(
                    users.as_ref(),
                    NewUser {
                        external_id: Some(external_id.to_string()),
                        email,
                        password_hash: None,
                        display_name,
                        slug: String::new(),
                        photo_url: normalize_photo(profile.photo_url.as_deref()),
                        provider,
                    },
                )
                .await?
            }
        };

        Ok(user.into())
    }

    async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserView> {
        let mut user = self.find_user(user_id).await?;

        let photo_rejected = user.update_profile(
            update.display_name.as_deref(),
            update.bio.as_deref(),
            update.photo_url.as_deref(),
        );
        if photo_rejected {
            tracing::warn!(user_id, "Ignoring photo that is neither an inline image nor a URL");
        }
        user.touch(Utc::now());

        let user = save_with_slug(self.uow.users().as_ref(), &mut user).await?;
        Ok(user.into())
    }

    async fn get_user(&self, user_id: i32) -> AppResult<UserView> {
        Ok(self.find_user(user_id).await?.into())
    }

    async fn get_user_by_slug(&self, slug: &str) -> AppResult<UserView> {
        Ok(self.find_user_by_slug(slug).await?.into())
    }

    async fn get_user_stats(&self, user_id: i32) -> AppResult<UserStats> {
        let user = self.find_user(user_id).await?;
        self.uow.stats().user_stats(&user).await
    }

    async fn get_user_stats_by_slug(&self, slug: &str) -> AppResult<UserStats> {
        let user = self.find_user_by_slug(slug).await?;
        self.uow.stats().user_stats(&user).await
    }

    async fn request_password_reset(&self, email: String) -> AppResult<AuthResponse> {
        let users = self.uow.users();
        let Some(mut user) = users.find_by_email(&normalize_email(&email)).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(AuthResponse::message(RESET_REQUESTED_MESSAGE));
        };
        if !user.is_active {
            tracing::debug!(user_id = user.id, "Password reset requested for inactive account");
            return Ok(AuthResponse::message(RESET_REQUESTED_MESSAGE));
        }

        let now = Utc::now();
        let token = self.credentials.issue_reset_token(users.as_ref(), now).await?;
        users.store_reset_token(user.id, &token, now).await?;
        user.set_reset_token(&token);
        user.touch(now);

        let mailer = self.mailer.clone();
        let delivery = best_effort("password_reset_mail", async {
            if mailer
                .send_password_reset_code(&user.email, token.code(), &user.display_name)
                .await
            {
                Ok(())
            } else {
                Err("mailer rejected the message")
            }
        })
        .await;

        if !delivery.is_delivered() {
            tracing::warn!(
                user_id = user.id,
                email = %user.email,
                code = %token.code(),
                "Password reset code could not be mailed"
            );
        }

        Ok(AuthResponse::message(RESET_REQUESTED_MESSAGE))
    }

    async fn confirm_password_reset(
        &self,
        token: String,
        new_password: String,
    ) -> AppResult<AuthResponse> {
        let user = self
            .credentials
            .consume_reset_token(self.uow.as_ref(), &token, &new_password, Utc::now())
            .await?;

        tracing::info!(user_id = user.id, "Password reset completed");
        Ok(AuthResponse::message("Password has been reset"))
    }

    async fn delete_account(&self, user_id: i32) -> AppResult<DeletionReport> {
        self.find_user(user_id).await?;
        let plan = plan_deletion(user_id)?;

        let report = with_transaction!(self.uow, |ctx| {
            let report = integrity::execute(ctx.connection(), &plan).await?;
            if !report.root_deleted() {
                return Err(AppError::NotFound("User"));
            }
            Ok(report)
        })?;

        tracing::info!(
            user_id,
            dependents = report.dependents_removed(),
            "Account deleted"
        );
        Ok(report)
    }

    async fn update_agreements(
        &self,
        user_id: i32,
        terms_accepted: bool,
        privacy_accepted: bool,
    ) -> AppResult<UserView> {
        let mut user = self.find_user(user_id).await?;
        user.accept_agreements(terms_accepted, privacy_accepted);
        user.touch(Utc::now());

        let user = self.uow.users().save(&user).await?;
        Ok(user.into())
    }
}

/// Display name for a new federated account; falls back to the email's local part.
fn federated_display_name(display_name: &str, email: &str) -> String {
    let display_name = display_name.trim();
    if !display_name.is_empty() {
        return display_name.to_string();
    }
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{TransactionContext, TxFuture};
    use crate::repository::{
        MessageRepository, MockMessageRepository, MockNotificationRepository,
        MockStatsRepository, MockUserRepository, NotificationRepository, StatsRepository,
        UserRepository,
    };
    use crate::service::mailer::MockMailer;
    use chrono::Duration;
    use domain::Password;
    use mockall::predicate::eq;

    /// Test mock for UnitOfWork that wraps repository mocks
    struct TestUnitOfWork {
        user_repo: Arc<MockUserRepository>,
        stats_repo: Arc<MockStatsRepository>,
    }

    impl TestUnitOfWork {
        fn new(user_repo: MockUserRepository, stats_repo: MockStatsRepository) -> Self {
            Self {
                user_repo: Arc::new(user_repo),
                stats_repo: Arc::new(stats_repo),
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for TestUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.user_repo.clone()
        }

        fn messages(&self) -> Arc<dyn MessageRepository> {
            Arc::new(MockMessageRepository::new())
        }

        fn notifications(&self) -> Arc<dyn NotificationRepository> {
            Arc::new(MockNotificationRepository::new())
        }

        fn stats(&self) -> Arc<dyn StatsRepository> {
            self.stats_repo.clone()
        }

        async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
            T: Send,
        {
            // Transaction not supported in test mock
            Err(AppError::internal("Transactions not supported in test mock"))
        }
    }

    fn manager(repo: MockUserRepository, mailer: MockMailer) -> AccountManager<TestUnitOfWork> {
        stats_manager(repo, MockStatsRepository::new(), mailer)
    }

    fn stats_manager(
        repo: MockUserRepository,
        stats: MockStatsRepository,
        mailer: MockMailer,
    ) -> AccountManager<TestUnitOfWork> {
        AccountManager::new(
            Arc::new(TestUnitOfWork::new(repo, stats)),
            Arc::new(mailer),
            CredentialStore::new(Duration::hours(1)),
        )
    }

    fn test_user(id: i32, provider: AuthProvider) -> User {
        User {
            id,
            external_id: provider.is_federated().then(|| "google-uid".to_string()),
            email: "owner@example.com".to_string(),
            password_hash: None,
            display_name: "Pet Owner".to_string(),
            slug: Some("pet_owner".to_string()),
            photo_url: None,
            bio: None,
            provider,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            password_reset_token: None,
            password_reset_expires_at: None,
            terms_accepted: false,
            privacy_accepted: false,
        }
    }

    fn created(id: i32, new_user: NewUser) -> User {
        User {
            external_id: new_user.external_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            slug: Some(new_user.slug),
            photo_url: new_user.photo_url,
            ..test_user(id, new_user.provider)
        }
    }

    #[tokio::test]
    async fn test_register_creates_local_account() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("new@example.com"))
            .returning(|_| Ok(None));
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_create().returning(|u| Ok(created(1, u)));

        let response = manager(repo, MockMailer::new())
            .register("  New@Example.com ".into(), "secret1".into(), "Ayşe Yılmaz".into())
            .await
            .unwrap();

        let user = response.user.unwrap();
        assert!(response.success);
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.slug.as_deref(), Some("ayse_yilmaz"));
        assert_eq!(user.provider, AuthProvider::Local);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Local))));
        repo.expect_create().never();

        let err = manager(repo, MockMailer::new())
            .register("OWNER@example.com".into(), "secret1".into(), "Owner".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(msg) if msg == "Email is already registered"));
    }

    #[tokio::test]
    async fn test_register_federated_email_conflicts() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Google))));

        let err = manager(repo, MockMailer::new())
            .register("owner@example.com".into(), "secret1".into(), "Owner".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("Google")));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let service = manager(MockUserRepository::new(), MockMailer::new());

        let missing = service
            .register("a@b.co".into(), "secret1".into(), "   ".into())
            .await;
        let short = service
            .register("a@b.co".into(), " 12345 ".into(), "Owner".into())
            .await;
        let bad_email = service
            .register("not-an-email".into(), "secret1".into(), "Owner".into())
            .await;

        assert!(matches!(missing, Err(AppError::Validation(_))));
        assert!(matches!(short, Err(AppError::Validation(_))));
        assert!(matches!(bad_email, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let err = manager(repo, MockMailer::new())
            .login("ghost@example.com".into(), "secret1".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound("User")));
    }

    #[tokio::test]
    async fn test_login_inactive_before_provider() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| {
            let mut user = test_user(1, AuthProvider::Google);
            user.is_active = false;
            Ok(Some(user))
        });

        let err = manager(repo, MockMailer::new())
            .login("owner@example.com".into(), "secret1".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InactiveAccount));
    }

    #[tokio::test]
    async fn test_login_google_account_is_wrong_provider() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Google))));

        let err = manager(repo, MockMailer::new())
            .login("owner@example.com".into(), "whatever".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::WrongProvider));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let hash = Password::new("secret1").unwrap().into_string();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |_| {
            let mut user = test_user(1, AuthProvider::Local);
            user.password_hash = Some(hash.clone());
            Ok(Some(user))
        });
        repo.expect_record_login()
            .with(eq(1), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_save().never();
        let service = manager(repo, MockMailer::new());

        let wrong = service
            .login("owner@example.com".into(), "secret2".into())
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        let ok = service
            .login("owner@example.com".into(), " secret1 ".into())
            .await
            .unwrap();
        assert!(ok.user.unwrap().updated_at.is_some());
    }

    #[tokio::test]
    async fn test_login_without_hash_is_invalid() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Local))));

        let err = manager(repo, MockMailer::new())
            .login("owner@example.com".into(), "secret1".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_federated_login_keeps_photo_when_blank() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id().returning(|_| {
            let mut user = test_user(1, AuthProvider::Google);
            user.photo_url = Some("https://img.example.com/p.png".to_string());
            Ok(Some(user))
        });
        repo.expect_save().returning(|u| Ok(u.clone()));

        let response = manager(repo, MockMailer::new())
            .federated_login(FederatedProfile {
                external_id: "google-uid".into(),
                email: "owner@example.com".into(),
                display_name: "Pet Owner".into(),
                photo_url: Some("  ".into()),
            })
            .await
            .unwrap();

        assert_eq!(
            response.user.unwrap().photo_url.as_deref(),
            Some("https://img.example.com/p.png")
        );
    }

    #[tokio::test]
    async fn test_federated_login_links_by_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id().returning(|_| Ok(None));
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(3, AuthProvider::Local))));
        repo.expect_save().returning(|u| Ok(u.clone()));
        repo.expect_create().never();

        let user = manager(repo, MockMailer::new())
            .federated_login(FederatedProfile {
                external_id: "g-123".into(),
                email: "Owner@Example.com".into(),
                display_name: "".into(),
                photo_url: None,
            })
            .await
            .unwrap()
            .user
            .unwrap();

        assert_eq!(user.id, 3);
        assert_eq!(user.external_id.as_deref(), Some("g-123"));
        assert_eq!(user.provider, AuthProvider::Google);
        assert_eq!(user.display_name, "Pet Owner");
    }

    #[tokio::test]
    async fn test_federated_login_creates_account() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_create().returning(|u| Ok(created(9, u)));

        let user = manager(repo, MockMailer::new())
            .federated_login(FederatedProfile {
                external_id: "g-9".into(),
                email: "luna@example.com".into(),
                display_name: " ".into(),
                photo_url: None,
            })
            .await
            .unwrap()
            .user
            .unwrap();

        assert_eq!(user.display_name, "luna");
        assert_eq!(user.provider, AuthProvider::Google);
        assert_eq!(user.slug.as_deref(), Some("luna"));
    }

    #[tokio::test]
    async fn test_update_profile_ignores_invalid_photo() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().with(eq(1)).returning(|_| {
            let mut user = test_user(1, AuthProvider::Local);
            user.photo_url = Some("https://img.example.com/old.png".to_string());
            Ok(Some(user))
        });
        repo.expect_save().returning(|u| Ok(u.clone()));

        let user = manager(repo, MockMailer::new())
            .update_profile(
                1,
                ProfileUpdate {
                    display_name: Some("New Name".into()),
                    bio: Some("Loves dogs".into()),
                    photo_url: Some("ftp://nope".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(user.display_name, "New Name");
        assert_eq!(user.bio.as_deref(), Some("Loves dogs"));
        assert_eq!(user.photo_url.as_deref(), Some("https://img.example.com/old.png"));
    }

    #[tokio::test]
    async fn test_update_profile_assigns_missing_slug() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| {
            let mut user = test_user(1, AuthProvider::Local);
            user.slug = None;
            Ok(Some(user))
        });
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_save().returning(|u| Ok(u.clone()));

        let user = manager(repo, MockMailer::new())
            .update_profile(1, ProfileUpdate::default())
            .await
            .unwrap();

        assert_eq!(user.slug.as_deref(), Some("pet_owner"));
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email_is_generic() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let mut mailer = MockMailer::new();
        mailer.expect_send_password_reset_code().never();

        let response = manager(repo, mailer)
            .request_password_reset("ghost@example.com".into())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, RESET_REQUESTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_request_reset_survives_mailer_failure() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Local))));
        repo.expect_find_by_reset_token().returning(|_| Ok(vec![]));
        repo.expect_store_reset_token()
            .withf(|id, token, _| *id == 1 && token.code().len() == 6)
            .times(1)
            .returning(|_, _, _| Ok(()));
        repo.expect_save().never();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_password_reset_code()
            .times(1)
            .returning(|_, _, _| false);

        let response = manager(repo, mailer)
            .request_password_reset("owner@example.com".into())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, RESET_REQUESTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_confirm_reset_validates_password_first() {
        let err = manager(MockUserRepository::new(), MockMailer::new())
            .confirm_password_reset("123456".into(), "123".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_account() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = manager(repo, MockMailer::new())
            .delete_account(42)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound("User")));
    }

    #[tokio::test]
    async fn test_update_agreements_is_idempotent() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(test_user(1, AuthProvider::Local))));
        repo.expect_save().times(2).returning(|u| Ok(u.clone()));
        let service = manager(repo, MockMailer::new());

        let first = service.update_agreements(1, true, true).await.unwrap();
        let second = service.update_agreements(1, true, true).await.unwrap();

        assert!(first.terms_accepted && first.privacy_accepted);
        assert_eq!(first.terms_accepted, second.terms_accepted);
        assert_eq!(first.privacy_accepted, second.privacy_accepted);
    }

    #[tokio::test]
    async fn test_stats_by_slug_reads_the_found_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_slug()
            .with(eq("pet_owner"))
            .returning(|_| Ok(Some(test_user(4, AuthProvider::Local))));
        let mut stats = MockStatsRepository::new();
        stats
            .expect_user_stats()
            .withf(|user: &User| user.id == 4)
            .times(1)
            .returning(|user| {
                Ok(UserStats {
                    stats_id: user.id,
                    followers: 3,
                    following: 1,
                    reviews: 2,
                })
            });

        let result = stats_manager(repo, stats, MockMailer::new())
            .get_user_stats_by_slug(" pet_owner ")
            .await
            .unwrap();

        assert_eq!(result.stats_id, 4);
        assert_eq!(result.followers, 3);
        assert_eq!(result.reviews, 2);
    }

    #[tokio::test]
    async fn test_stats_unknown_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let mut stats = MockStatsRepository::new();
        stats.expect_user_stats().never();

        let err = stats_manager(repo, stats, MockMailer::new())
            .get_user_stats(99)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound("User")));
    }
}
