//! Repository layer for data access.

pub mod entities;
mod message_repository;
mod stats_repository;
pub(crate) mod user_repository;

pub use message_repository::{
    MessageRepository, MessageStore, NotificationRepository, NotificationStore,
};
pub use stats_repository::{StatsRepository, StatsStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use message_repository::{MockMessageRepository, MockNotificationRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use stats_repository::MockStatsRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
