use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const REMINDER_TITLE: &str = "Mood Tracker Reminder";
pub const REMINDER_BODY: &str = "Hey, open the app and log your mood today!";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
}

impl NewNotification {
    pub fn reminder(user_id: Uuid) -> Self {
        Self {
            user_id,
            title: REMINDER_TITLE.into(),
            body: REMINDER_BODY.into(),
        }
    }
}
