//! Storage-backed slug allocation.
//!
//! The existence check is optimistic; the unique index on `users.slug` is
//! what actually guarantees uniqueness. A lost race surfaces from the
//! repository as `AppError::SlugTaken` and the slug is allocated again,
//! a bounded number of times.

use common::{AppError, AppResult};
use domain::slug::{base_slug, candidates};
use domain::{NewUser, User, MAX_SLUG_CANDIDATES};

use crate::repository::UserRepository;

/// Attempts at inserting or saving a row with a freshly allocated slug
pub const SLUG_INSERT_ATTEMPTS: usize = 5;

/// First candidate for `display_name` not currently owned by any user.
pub async fn allocate(users: &dyn UserRepository, display_name: &str) -> AppResult<String> {
    let base = base_slug(display_name);
    for candidate in candidates(&base).take(MAX_SLUG_CANDIDATES) {
        if !users.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::conflict(format!(
        "No free slug found for \"{}\"",
        base
    )))
}

/// Insert `new_user` under a newly allocated slug.
pub async fn create_with_slug(users: &dyn UserRepository, mut new_user: NewUser) -> AppResult<User> {
    for attempt in 1..=SLUG_INSERT_ATTEMPTS {
        new_user.slug = allocate(users, &new_user.display_name).await?;
        match users.create(new_user.clone()).await {
            Err(AppError::SlugTaken) => {
                tracing::warn!(slug = %new_user.slug, attempt, "Slug taken concurrently, retrying");
            }
            result => return result,
        }
    }
    Err(slug_exhausted())
}

/// Save `user`, first giving it a slug if it has none.
///
/// An existing slug is never replaced.
pub async fn save_with_slug(users: &dyn UserRepository, user: &mut User) -> AppResult<User> {
    if user.has_slug() {
        return users.save(user).await;
    }

    for attempt in 1..=SLUG_INSERT_ATTEMPTS {
        let slug = allocate(users, &user.display_name).await?;
        user.assign_slug_if_missing(slug);
        match users.save(user).await {
            Err(AppError::SlugTaken) => {
                tracing::warn!(user_id = user.id, attempt, "Slug taken concurrently, retrying");
                user.slug = None;
            }
            result => return result,
        }
    }
    Err(slug_exhausted())
}

fn slug_exhausted() -> AppError {
    AppError::conflict("Could not allocate a unique slug, please retry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use chrono::Utc;
    use domain::AuthProvider;
    use mockall::predicate::eq;

    fn new_user(display_name: &str) -> NewUser {
        NewUser {
            external_id: None,
            email: "max@example.com".to_string(),
            password_hash: None,
            display_name: display_name.to_string(),
            slug: String::new(),
            photo_url: None,
            provider: AuthProvider::Local,
        }
    }

    fn stored(id: i32, new_user: NewUser) -> User {
        User {
            id,
            external_id: new_user.external_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            slug: Some(new_user.slug),
            photo_url: new_user.photo_url,
            bio: None,
            provider: new_user.provider,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            password_reset_token: None,
            password_reset_expires_at: None,
            terms_accepted: false,
            privacy_accepted: false,
        }
    }

    #[tokio::test]
    async fn test_allocate_skips_taken() {
        let mut repo = MockUserRepository::new();
        repo.expect_slug_exists()
            .returning(|slug| Ok(slug == "max_power" || slug == "max_power_1"));

        let slug = allocate(&repo, "Max Power").await.unwrap();
        assert_eq!(slug, "max_power_2");
    }

    #[tokio::test]
    async fn test_create_retries_after_lost_race() {
        let mut repo = MockUserRepository::new();
        let mut taken = false;
        repo.expect_slug_exists()
            .returning(move |slug| Ok(slug == "max" && std::mem::replace(&mut taken, true)));

        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::SlugTaken));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|u| Ok(stored(1, u)));

        let user = create_with_slug(&repo, new_user("Max")).await.unwrap();
        assert_eq!(user.slug.as_deref(), Some("max_1"));
    }

    #[tokio::test]
    async fn test_create_gives_up_after_bounded_attempts() {
        let mut repo = MockUserRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_create()
            .times(SLUG_INSERT_ATTEMPTS)
            .returning(|_| Err(AppError::SlugTaken));

        let err = create_with_slug(&repo, new_user("Max")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mut repo = MockUserRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::conflict("Email is already registered")));

        let err = create_with_slug(&repo, new_user("Max")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("Email")));
    }

    #[tokio::test]
    async fn test_save_keeps_existing_slug() {
        let mut repo = MockUserRepository::new();
        repo.expect_slug_exists().never();
        repo.expect_save().returning(|u| Ok(u.clone()));

        let mut user = stored(4, NewUser {
            slug: "legacy".to_string(),
            ..new_user("Someone Else")
        });
        let saved = save_with_slug(&repo, &mut user).await.unwrap();
        assert_eq!(saved.slug.as_deref(), Some("legacy"));
    }

    #[tokio::test]
    async fn test_save_assigns_missing_slug() {
        let mut repo = MockUserRepository::new();
        repo.expect_slug_exists()
            .with(eq("luna"))
            .returning(|_| Ok(false));
        repo.expect_save().returning(|u| Ok(u.clone()));

        let mut user = stored(4, new_user("Luna"));
        user.slug = None;
        let saved = save_with_slug(&repo, &mut user).await.unwrap();
        assert_eq!(saved.slug.as_deref(), Some("luna"));
    }
}
