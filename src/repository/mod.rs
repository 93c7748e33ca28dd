//! Storage seams. Services depend on these traits; `postgres` backs them in
//! production and `memory` backs them in tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::daily_log::{DailyLog, Mood, Satisfaction};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::User;
use crate::services::daily_logs::{TrackerPolicy, TrackerUpdate};
use crate::services::date_window::DayRange;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Column a histogram is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Mood,
    Satisfaction,
}

#[derive(Debug, Clone)]
pub struct NewDailyLog {
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub mood: Option<Mood>,
    pub thoughts: Option<String>,
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Owner-scoped lookup; another user's log is indistinguishable from a missing one.
    async fn find_by_id(&self, user_id: Uuid, log_id: Uuid) -> AppResult<Option<DailyLog>>;

    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        range: DayRange,
    ) -> AppResult<Option<DailyLog>>;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        range: DayRange,
        order: SortOrder,
    ) -> AppResult<Vec<DailyLog>>;

    /// Fails with `AppError::Conflict` when the user already has a log that day.
    async fn create(&self, new_log: NewDailyLog) -> AppResult<DailyLog>;

    /// Applies a tracker update in one statement against the stored values, so
    /// concurrent updates never overwrite each other. `None` when no log with a
    /// mood matched, or when the result would exceed the daily limits.
    async fn apply_trackers(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        update: TrackerUpdate,
        policy: TrackerPolicy,
    ) -> AppResult<Option<DailyLog>>;

    /// Derives `completed` from the stored mood and satisfaction. Returns
    /// whether the flag changed.
    async fn refresh_completed(&self, user_id: Uuid, log_id: Uuid) -> AppResult<bool>;

    /// Sets satisfaction only if the log has a mood and no satisfaction yet, in
    /// one atomic step. `None` means no row matched those conditions.
    async fn set_satisfaction_if_unset(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        satisfaction: Satisfaction,
    ) -> AppResult<Option<DailyLog>>;

    /// Counts logs per value of `field`; unset values are not counted.
    async fn aggregate_count(
        &self,
        user_id: Uuid,
        range: DayRange,
        field: GroupField,
    ) -> AppResult<BTreeMap<String, i64>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_ids(&self) -> AppResult<Vec<Uuid>>;

    async fn inactive_since(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>>;

    /// Upserts the user's mirror row and stamps `last_active_at`. A subject
    /// seen for the first time is provisioned here.
    async fn record_activity(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification>;

    async fn list_unread(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Returns false when the notification does not exist or is not the user's.
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool>;
}
