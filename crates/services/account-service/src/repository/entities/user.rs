//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};

use domain::{AuthProvider, NewUser, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub external_id: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: String,
    #[sea_orm(unique)]
    pub slug: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub photo_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub provider: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<DateTimeUtc>,
    pub terms_accepted: bool,
    pub privacy_accepted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            external_id: model.external_id,
            email: model.email,
            password_hash: model.password_hash,
            display_name: model.display_name,
            slug: model.slug,
            photo_url: model.photo_url,
            bio: model.bio,
            provider: AuthProvider::from(model.provider.as_str()),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
            password_reset_token: model.password_reset_token,
            password_reset_expires_at: model.password_reset_expires_at,
            terms_accepted: model.terms_accepted,
            privacy_accepted: model.privacy_accepted,
        }
    }
}

/// Update of the profile, identity and agreement columns.
///
/// Credential columns stay `NotSet`: they change only through the targeted
/// reset statements, so a stale `User` can never write them back.
impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id),
            external_id: Set(user.external_id.clone()),
            email: Set(user.email.clone()),
            password_hash: NotSet,
            display_name: Set(user.display_name.clone()),
            slug: Set(user.slug.clone()),
            photo_url: Set(user.photo_url.clone()),
            bio: Set(user.bio.clone()),
            provider: Set(user.provider.to_string()),
            is_active: Set(user.is_active),
            created_at: NotSet,
            updated_at: Set(user.updated_at),
            password_reset_token: NotSet,
            password_reset_expires_at: NotSet,
            terms_accepted: Set(user.terms_accepted),
            privacy_accepted: Set(user.privacy_accepted),
        }
    }
}

impl ActiveModel {
    /// Insert model for a new account created at `now`
    pub fn for_new_user(new_user: NewUser, now: DateTimeUtc) -> Self {
        ActiveModel {
            id: NotSet,
            external_id: Set(new_user.external_id),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            display_name: Set(new_user.display_name),
            slug: Set(Some(new_user.slug)),
            photo_url: Set(new_user.photo_url),
            bio: Set(None),
            provider: Set(new_user.provider.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
            password_reset_token: Set(None),
            password_reset_expires_at: Set(None),
            terms_accepted: Set(false),
            privacy_accepted: Set(false),
        }
    }
}
