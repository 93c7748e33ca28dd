use chrono::NaiveTime;
use std::time::Duration;

use crate::services::date_window::DateWindow;
use crate::services::reconcile::ReconcileJob;
use crate::services::reminders::ReminderJob;

/// Runs the daily reconciliation at `at` local time, every day.
pub fn spawn_reconcile_worker(job: ReconcileJob, window: DateWindow, at: NaiveTime) {
    tokio::spawn(async move {
        loop {
            let wait = window.until_next(at);
            tracing::debug!(wait_secs = wait.as_secs(), "Next daily reconciliation scheduled");
            tokio::time::sleep(wait).await;

            if let Err(e) = job.reconcile_all_users().await {
                tracing::error!(error = %e, "Daily reconciliation could not start");
            }
        }
    });
}

pub fn spawn_reminder_worker(job: ReminderJob, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = job.send_reminders().await {
                tracing::error!(error = %e, "Reminder worker error");
            }
        }
    });
}
