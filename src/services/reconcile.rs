use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{LogRepository, NewDailyLog, UserRepository};
use crate::services::date_window::DateWindow;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub users: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Nightly sweep: every user ends the day with a log, and every log's
/// `completed` flag matches its contents.
#[derive(Clone)]
pub struct ReconcileJob {
    logs: Arc<dyn LogRepository>,
    users: Arc<dyn UserRepository>,
    window: DateWindow,
    concurrency: usize,
}

impl ReconcileJob {
    pub fn new(
        logs: Arc<dyn LogRepository>,
        users: Arc<dyn UserRepository>,
        window: DateWindow,
        concurrency: usize,
    ) -> Self {
        Self {
            logs,
            users,
            window,
            concurrency: concurrency.max(1),
        }
    }

    /// One user's failure is logged and counted; the rest still run.
    pub async fn reconcile_all_users(&self) -> AppResult<ReconcileReport> {
        let user_ids = self.users.list_ids().await?;
        let today = self.window.today();

        let results: Vec<(Uuid, AppResult<Outcome>)> = stream::iter(user_ids)
            .map(|user_id| async move { (user_id, self.reconcile_user(user_id, today).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = ReconcileReport {
            users: results.len(),
            ..Default::default()
        };
        for (user_id, result) in results {
            match result {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Ok(Outcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Reconciliation failed for user");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            date = %today,
            users = report.users,
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            "Daily reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_user(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Outcome> {
        let existing = self
            .logs
            .find_by_user_and_date(user_id, self.window.day_range(today)?)
            .await?;

        let Some(log) = existing else {
            let placeholder = NewDailyLog {
                user_id,
                log_date: today,
                mood: None,
                thoughts: None,
            };
            return match self.logs.create(placeholder).await {
                Ok(_) => Ok(Outcome::Created),
                // The user submitted between our read and insert.
                Err(AppError::Conflict(_)) => Ok(Outcome::Unchanged),
                Err(e) => Err(e),
            };
        };

        if log.completed == log.is_complete() {
            return Ok(Outcome::Unchanged);
        }
        // Recomputed from the row itself, so trackers written since our read survive.
        if self.logs.refresh_completed(user_id, log.id).await? {
            Ok(Outcome::Updated)
        } else {
            Ok(Outcome::Unchanged)
        }
    }
}
