//! Message and notification repositories.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, EntityTrait, Set,
};

use super::entities::{message, notification, user_request};
use common::AppResult;
use domain::{Message, NewMessage, NewNotification, Notification};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Message repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Whether the user request (job) a message is attached to exists
    async fn job_exists(&self, job_id: i32) -> AppResult<bool>;

    async fn create(&self, new_message: NewMessage) -> AppResult<Message>;
}

/// Notification repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, new_notification: NewNotification) -> AppResult<Notification>;
}

/// Concrete implementation of MessageRepository
pub struct MessageStore {
    db: DatabaseConnection,
}

impl MessageStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageRepository for MessageStore {
    async fn job_exists(&self, job_id: i32) -> AppResult<bool> {
        job_exists(&self.db, job_id).await
    }

    async fn create(&self, new_message: NewMessage) -> AppResult<Message> {
        let model = message::ActiveModel {
            id: NotSet,
            sender_id: Set(new_message.sender_id),
            receiver_id: Set(new_message.receiver_id),
            job_id: Set(new_message.job_id),
            content: Set(new_message.content),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Message::from(model))
    }
}

/// Concrete implementation of NotificationRepository
pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn create(&self, new_notification: NewNotification) -> AppResult<Notification> {
        let model = notification::ActiveModel {
            id: NotSet,
            user_id: Set(new_notification.user_id),
            kind: Set(new_notification.kind),
            title: Set(new_notification.title),
            message: Set(new_notification.message),
            related_user_id: Set(new_notification.related_user_id),
            related_job_id: Set(new_notification.related_job_id),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Notification::from(model))
    }
}

async fn job_exists<C: ConnectionTrait>(conn: &C, job_id: i32) -> AppResult<bool> {
    Ok(user_request::Entity::find_by_id(job_id)
        .one(conn)
        .await?
        .is_some())
}
