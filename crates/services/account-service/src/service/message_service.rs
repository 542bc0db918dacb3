//! Messaging between users about a job, with a best-effort notification
//! for the receiver.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use common::{AppError, AppResult};
use domain::{Message, NewMessage, NewNotification, NOTIFICATION_TYPE_MESSAGE};

use super::side_effect::{best_effort, Delivery};
use crate::infra::UnitOfWork;

/// A stored message and what happened to its notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReceipt {
    pub message: Message,
    pub notification: Delivery,
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn send_message(
        &self,
        sender_id: i32,
        receiver_id: i32,
        job_id: i32,
        content: String,
    ) -> AppResult<MessageReceipt>;
}

pub struct MessageManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> MessageManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> MessageService for MessageManager<U> {
    async fn send_message(
        &self,
        sender_id: i32,
        receiver_id: i32,
        job_id: i32,
        content: String,
    ) -> AppResult<MessageReceipt> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::validation("Message content is required"));
        }

        let users = self.uow.users();
        let sender = users
            .find_by_id(sender_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;
        if users.find_by_id(receiver_id).await?.is_none() {
            return Err(AppError::NotFound("User"));
        }
        let messages = self.uow.messages();
        if !messages.job_exists(job_id).await? {
            return Err(AppError::NotFound("Job"));
        }

        let message = messages
            .create(NewMessage {
                sender_id,
                receiver_id,
                job_id,
                content,
            })
            .await?;

        let notification = if sender_id == receiver_id {
            Delivery::Skipped
        } else {
            let notifications = self.uow.notifications();
            best_effort(
                "message_notification",
                notifications.create(NewNotification {
                    user_id: receiver_id,
                    kind: NOTIFICATION_TYPE_MESSAGE.to_string(),
                    title: "New message".to_string(),
                    message: format!("{} sent you a message", sender.display_name),
                    related_user_id: Some(sender_id),
                    related_job_id: Some(job_id),
                }),
            )
            .await
        };

        tracing::debug!(
            message_id = message.id,
            sender_id,
            receiver_id,
            ?notification,
            "Message sent"
        );
        Ok(MessageReceipt {
            message,
            notification,
        })
    }
}
