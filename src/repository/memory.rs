use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    GroupField, LogRepository, NewDailyLog, NotificationRepository, SortOrder, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::models::daily_log::{DailyLog, Mood, Satisfaction};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::User;
use crate::services::daily_logs::{TrackerPolicy, TrackerUpdate, MAX_SLEEP_HOURS};
use crate::services::date_window::DayRange;

/// In-memory store for tests. One lock guards every collection, so the
/// uniqueness check and the insert happen atomically, like the database
/// constraint they stand in for.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    logs: Vec<DailyLog>,
    users: Vec<User>,
    notifications: Vec<Notification>,
    failing_users: HashSet<Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, last_active_at: Option<DateTime<Utc>>) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().await;
        inner.users.push(User {
            id,
            email: Some(format!("{}@example.com", id.simple())),
            name: Some("Test User".into()),
            last_active_at,
            created_at: Utc::now(),
        });
        id
    }

    /// Seeds a log on an arbitrary date, bypassing the state machine.
    pub async fn seed_log(
        &self,
        user_id: Uuid,
        log_date: NaiveDate,
        mood: Option<Mood>,
        satisfaction: Option<Satisfaction>,
    ) -> DailyLog {
        let now = Utc::now();
        let log = DailyLog {
            id: Uuid::new_v4(),
            user_id,
            log_date,
            mood,
            thoughts: None,
            satisfaction,
            water_glasses: 0,
            sleep_hours: 0.0,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().await.logs.push(log.clone());
        log
    }

    /// Every storage call touching this user's data fails from now on.
    pub async fn fail_for(&self, user_id: Uuid) {
        self.inner.lock().await.failing_users.insert(user_id);
    }

    pub async fn logs_for(&self, user_id: Uuid) -> Vec<DailyLog> {
        let inner = self.inner.lock().await;
        inner
            .logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        let inner = self.inner.lock().await;
        inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Inner {
    fn check(&self, user_id: Uuid) -> AppResult<()> {
        if self.failing_users.contains(&user_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "storage unavailable for user {}",
                user_id
            )));
        }
        Ok(())
    }

    fn in_range(&self, user_id: Uuid, range: DayRange) -> impl Iterator<Item = &DailyLog> + '_ {
        self.logs
            .iter()
            .filter(move |l| l.user_id == user_id && range.contains(l.log_date))
    }
}

#[async_trait]
impl LogRepository for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid, log_id: Uuid) -> AppResult<Option<DailyLog>> {
        let inner = self.inner.lock().await;
        inner.check(user_id)?;
        Ok(inner
            .logs
            .iter()
            .find(|l| l.id == log_id && l.user_id == user_id)
            .cloned())
    }

    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        range: DayRange,
    ) -> AppResult<Option<DailyLog>> {
        let inner = self.inner.lock().await;
        inner.check(user_id)?;
        let found = inner.in_range(user_id, range).next().cloned();
        Ok(found)
    }

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        range: DayRange,
        order: SortOrder,
    ) -> AppResult<Vec<DailyLog>> {
        let inner = self.inner.lock().await;
        inner.check(user_id)?;
        let mut logs: Vec<DailyLog> = inner.in_range(user_id, range).cloned().collect();
        logs.sort_by_key(|l| l.log_date);
        if order == SortOrder::Descending {
            logs.reverse();
        }
        Ok(logs)
    }

    async fn create(&self, new_log: NewDailyLog) -> AppResult<DailyLog> {
        let mut inner = self.inner.lock().await;
        inner.check(new_log.user_id)?;
        if inner
            .logs
            .iter()
            .any(|l| l.user_id == new_log.user_id && l.log_date == new_log.log_date)
        {
            return Err(AppError::Conflict("Mood already submitted for today".into()));
        }

        let now = Utc::now();
        let log = DailyLog {
            id: Uuid::new_v4(),
            user_id: new_log.user_id,
            log_date: new_log.log_date,
            mood: new_log.mood,
            thoughts: new_log.thoughts,
            satisfaction: None,
            water_glasses: 0,
            sleep_hours: 0.0,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        inner.logs.push(log.clone());
        Ok(log)
    }

    async fn apply_trackers(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        update: TrackerUpdate,
        policy: TrackerPolicy,
    ) -> AppResult<Option<DailyLog>> {
        let mut inner = self.inner.lock().await;
        inner.check(user_id)?;
        let Some(stored) = inner
            .logs
            .iter_mut()
            .find(|l| l.id == log_id && l.user_id == user_id && l.mood.is_some())
        else {
            return Ok(None);
        };

        let (water, sleep) = match policy {
            TrackerPolicy::Overwrite => (
                Some(update.water_glasses.unwrap_or(stored.water_glasses)),
                update.sleep_hours.unwrap_or(stored.sleep_hours),
            ),
            TrackerPolicy::Increment => (
                stored
                    .water_glasses
                    .checked_add(update.water_glasses.unwrap_or(0)),
                stored.sleep_hours + update.sleep_hours.unwrap_or(0.0),
            ),
        };
        let Some(water) = water.filter(|_| sleep <= MAX_SLEEP_HOURS) else {
            return Ok(None);
        };

        stored.water_glasses = water;
        stored.sleep_hours = sleep;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn refresh_completed(&self, user_id: Uuid, log_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        inner.check(user_id)?;
        let Some(stored) = inner
            .logs
            .iter_mut()
            .find(|l| l.id == log_id && l.user_id == user_id)
        else {
            return Ok(false);
        };

        let completed = stored.is_complete();
        if stored.completed == completed {
            return Ok(false);
        }
        stored.completed = completed;
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_satisfaction_if_unset(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        satisfaction: Satisfaction,
    ) -> AppResult<Option<DailyLog>> {
        let mut inner = self.inner.lock().await;
        inner.check(user_id)?;
        let Some(stored) = inner
            .logs
            .iter_mut()
            .find(|l| {
                l.id == log_id
                    && l.user_id == user_id
                    && l.mood.is_some()
                    && l.satisfaction.is_none()
            })
        else {
            return Ok(None);
        };

        stored.satisfaction = Some(satisfaction);
        stored.completed = true;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn aggregate_count(
        &self,
        user_id: Uuid,
        range: DayRange,
        field: GroupField,
    ) -> AppResult<BTreeMap<String, i64>> {
        let inner = self.inner.lock().await;
        inner.check(user_id)?;
        let mut counts = BTreeMap::new();
        for log in inner.in_range(user_id, range) {
            let key = match field {
                GroupField::Mood => log.mood.map(|m| m.as_str()),
                GroupField::Satisfaction => log.satisfaction.map(|s| s.as_str()),
            };
            if let Some(key) = key {
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_ids(&self) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().map(|u| u.id).collect())
    }

    async fn inactive_since(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.last_active_at.is_some_and(|at| at < cutoff))
            .cloned()
            .collect())
    }

    async fn record_activity(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check(user_id)?;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            if email.is_some() {
                user.email = email.map(str::to_string);
            }
            user.last_active_at = Some(at);
            return Ok(());
        }
        inner.users.push(User {
            id: user_id,
            email: email.map(str::to_string),
            name: None,
            last_active_at: Some(at),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let mut inner = self.inner.lock().await;
        inner.check(notification.user_id)?;
        let created = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            body: notification.body,
            is_read: false,
            created_at: Utc::now(),
        };
        inner.notifications.push(created.clone());
        Ok(created)
    }

    async fn list_unread(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let inner = self.inner.lock().await;
        let mut unread: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .cloned()
            .collect();
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unread)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
