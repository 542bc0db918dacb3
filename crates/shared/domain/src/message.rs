//! Message and notification entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message exchanged about a user request (job)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub job_id: i32,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub job_id: i32,
    pub content: String,
}

/// An in-app notification owned by `user_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_user_id: Option<i32>,
    pub related_job_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i32,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_user_id: Option<i32>,
    pub related_job_id: Option<i32>,
}
