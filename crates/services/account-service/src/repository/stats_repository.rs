//! Profile stats read model over favorites and comments.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use super::entities::{user_comment, user_favorite};
use common::AppResult;
use domain::{User, UserStats, FOLLOW_FAVORITE_KINDS};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Follower, following and review counts for `user`
    async fn user_stats(&self, user: &User) -> AppResult<UserStats>;
}

pub struct StatsStore {
    db: DatabaseConnection,
}

impl StatsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatsRepository for StatsStore {
    async fn user_stats(&self, user: &User) -> AppResult<UserStats> {
        let follows = || {
            user_favorite::Entity::find()
                .filter(user_favorite::Column::Kind.is_in(FOLLOW_FAVORITE_KINDS.iter().copied()))
        };

        let following = follows()
            .filter(user_favorite::Column::UserId.eq(user.id))
            .count(&self.db)
            .await?;

        // Older favorites only carry the followed user's display name
        let followers = follows()
            .filter(
                Condition::any()
                    .add(user_favorite::Column::TargetUserId.eq(user.id))
                    .add(
                        Condition::all()
                            .add(user_favorite::Column::TargetUserId.is_null())
                            .add(user_favorite::Column::Title.eq(user.display_name.as_str())),
                    ),
            )
            .count(&self.db)
            .await?;

        let reviews = user_comment::Entity::find()
            .filter(user_comment::Column::CardId.is_in(user.review_card_ids()))
            .count(&self.db)
            .await?;

        Ok(UserStats {
            stats_id: user.id,
            followers,
            following,
            reviews,
        })
    }
}
