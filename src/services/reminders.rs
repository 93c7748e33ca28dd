use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::notification::NewNotification;
use crate::repository::{LogRepository, NotificationRepository, UserRepository};
use crate::services::date_window::DateWindow;
use crate::services::push::PushSender;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReminderReport {
    pub candidates: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Skipped,
}

/// Nudges users who have been away for a while and have not finished today's log.
#[derive(Clone)]
pub struct ReminderJob {
    users: Arc<dyn UserRepository>,
    logs: Arc<dyn LogRepository>,
    notifications: Arc<dyn NotificationRepository>,
    push: Arc<dyn PushSender>,
    window: DateWindow,
    inactive_after: chrono::Duration,
    concurrency: usize,
}

impl ReminderJob {
    pub fn new(
        users: Arc<dyn UserRepository>,
        logs: Arc<dyn LogRepository>,
        notifications: Arc<dyn NotificationRepository>,
        push: Arc<dyn PushSender>,
        window: DateWindow,
        inactive_after: chrono::Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            users,
            logs,
            notifications,
            push,
            window,
            inactive_after,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn send_reminders(&self) -> AppResult<ReminderReport> {
        let cutoff = self.window.now() - self.inactive_after;
        let candidates = self.users.inactive_since(cutoff).await?;

        let results: Vec<(Uuid, AppResult<Outcome>)> = stream::iter(candidates)
            .map(|user| async move { (user.id, self.remind(user.id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = ReminderReport {
            candidates: results.len(),
            ..Default::default()
        };
        for (user_id, result) in results {
            match result {
                Ok(Outcome::Sent) => report.sent += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Reminder failed for user");
                    report.failed += 1;
                }
            }
        }

        if report.candidates > 0 {
            tracing::info!(
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "Reminder sweep finished"
            );
        }
        Ok(report)
    }

    async fn remind(&self, user_id: Uuid) -> AppResult<Outcome> {
        let today = self.window.day_range(self.window.today())?;
        let done_today = self
            .logs
            .find_by_user_and_date(user_id, today)
            .await?
            .is_some_and(|log| log.is_complete());
        if done_today {
            return Ok(Outcome::Skipped);
        }

        let notification = self
            .notifications
            .create(NewNotification::reminder(user_id))
            .await?;

        // The stored notification is the source of truth; delivery is best effort.
        if let Err(e) = self
            .push
            .deliver(user_id, &notification.title, &notification.body)
            .await
        {
            tracing::warn!(user_id = %user_id, error = %e, "Push delivery failed");
        }

        Ok(Outcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::daily_log::{Mood, Satisfaction};
    use crate::models::notification::REMINDER_TITLE;
    use crate::repository::memory::MemoryStore;
    use crate::services::daily_logs::tests::fixed_window;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingPush {
        delivered: Mutex<Vec<Uuid>>,
        fail: bool,
    }

    #[async_trait]
    impl PushSender for RecordingPush {
        async fn deliver(&self, user_id: Uuid, _title: &str, _body: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("device token expired");
            }
            self.delivered.lock().await.push(user_id);
            Ok(())
        }
    }

    const NOW: &str = "2024-03-15T18:00:00Z";

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(NOW).unwrap().with_timezone(&Utc)
    }

    fn job(store: &MemoryStore, push: Arc<RecordingPush>) -> ReminderJob {
        ReminderJob::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            push,
            fixed_window(NOW),
            Duration::hours(6),
            2,
        )
    }

    #[tokio::test]
    async fn test_reminds_only_inactive_users_without_complete_log() {
        let store = MemoryStore::new();
        let active = store.add_user(Some(now() - Duration::hours(1))).await;
        let idle = store.add_user(Some(now() - Duration::hours(7))).await;
        let idle_done = store.add_user(Some(now() - Duration::hours(9))).await;
        store
            .seed_log(
                idle_done,
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                Some(Mood::Happy),
                Some(Satisfaction::Good),
            )
            .await;
        let push = Arc::new(RecordingPush::default());

        let report = job(&store, push.clone()).send_reminders().await.unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.skipped, 1);
        assert!(store.notifications_for(active).await.is_empty());
        assert!(store.notifications_for(idle_done).await.is_empty());
        let sent = store.notifications_for(idle).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, REMINDER_TITLE);
        assert_eq!(*push.delivered.lock().await, vec![idle]);
    }

    #[tokio::test]
    async fn test_push_failure_keeps_notification() {
        let store = MemoryStore::new();
        let idle = store.add_user(Some(now() - Duration::hours(12))).await;
        let push = Arc::new(RecordingPush {
            fail: true,
            ..Default::default()
        });

        let report = job(&store, push).send_reminders().await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(store.notifications_for(idle).await.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_isolated() {
        let store = MemoryStore::new();
        let broken = store.add_user(Some(now() - Duration::hours(12))).await;
        let fine = store.add_user(Some(now() - Duration::hours(12))).await;
        store.fail_for(broken).await;

        let report = job(&store, Arc::new(RecordingPush::default()))
            .send_reminders()
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(store.notifications_for(fine).await.len(), 1);
    }
}
