use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    GroupField, LogRepository, NewDailyLog, NotificationRepository, SortOrder, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::models::daily_log::{DailyLog, Satisfaction};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::User;
use crate::services::daily_logs::{TrackerPolicy, TrackerUpdate, MAX_SLEEP_HOURS};
use crate::services::date_window::DayRange;

/// Postgres-backed store. The `(user_id, log_date)` unique constraint on
/// `daily_logs` is what makes same-day double submission impossible.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Mood already submitted for today".into())
        }
        // No mirrored user row yet: the owner is unknown to this service.
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound("User not found".into())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl LogRepository for PgStore {
    async fn find_by_id(&self, user_id: Uuid, log_id: Uuid) -> AppResult<Option<DailyLog>> {
        let log = sqlx::query_as::<_, DailyLog>(
            "SELECT * FROM daily_logs WHERE id = $1 AND user_id = $2",
        )
        .bind(log_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(log)
    }

    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        range: DayRange,
    ) -> AppResult<Option<DailyLog>> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT * FROM daily_logs
            WHERE user_id = $1 AND log_date >= $2 AND log_date < $3
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_optional(&self.db)
        .await?;

        Ok(log)
    }

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        range: DayRange,
        order: SortOrder,
    ) -> AppResult<Vec<DailyLog>> {
        let sql = match order {
            SortOrder::Ascending => {
                r#"
                SELECT * FROM daily_logs
                WHERE user_id = $1 AND log_date >= $2 AND log_date < $3
                ORDER BY log_date ASC
                "#
            }
            SortOrder::Descending => {
                r#"
                SELECT * FROM daily_logs
                WHERE user_id = $1 AND log_date >= $2 AND log_date < $3
                ORDER BY log_date DESC
                "#
            }
        };

        let logs = sqlx::query_as::<_, DailyLog>(sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await?;

        Ok(logs)
    }

    async fn create(&self, new_log: NewDailyLog) -> AppResult<DailyLog> {
        sqlx::query_as::<_, DailyLog>(
            r#"
            INSERT INTO daily_logs (id, user_id, log_date, mood, thoughts)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_log.user_id)
        .bind(new_log.log_date)
        .bind(new_log.mood)
        .bind(&new_log.thoughts)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }

    async fn apply_trackers(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        update: TrackerUpdate,
        policy: TrackerPolicy,
    ) -> AppResult<Option<DailyLog>> {
        let sql = match policy {
            TrackerPolicy::Overwrite => {
                r#"
                UPDATE daily_logs SET
                    water_glasses = COALESCE($3, water_glasses),
                    sleep_hours = COALESCE($4, sleep_hours),
                    updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND mood IS NOT NULL
                    AND COALESCE($4, sleep_hours) <= $5
                RETURNING *
                "#
            }
            TrackerPolicy::Increment => {
                r#"
                UPDATE daily_logs SET
                    water_glasses = water_glasses + COALESCE($3, 0),
                    sleep_hours = sleep_hours + COALESCE($4, 0),
                    updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND mood IS NOT NULL
                    AND sleep_hours + COALESCE($4, 0) <= $5
                    AND water_glasses::BIGINT + COALESCE($3, 0) <= 2147483647
                RETURNING *
                "#
            }
        };

        let log = sqlx::query_as::<_, DailyLog>(sql)
            .bind(log_id)
            .bind(user_id)
            .bind(update.water_glasses)
            .bind(update.sleep_hours)
            .bind(MAX_SLEEP_HOURS)
            .fetch_optional(&self.db)
            .await?;

        Ok(log)
    }

    async fn refresh_completed(&self, user_id: Uuid, log_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE daily_logs SET
                completed = (mood IS NOT NULL AND satisfaction IS NOT NULL),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
                AND completed <> (mood IS NOT NULL AND satisfaction IS NOT NULL)
            "#,
        )
        .bind(log_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_satisfaction_if_unset(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        satisfaction: Satisfaction,
    ) -> AppResult<Option<DailyLog>> {
        // Compare-and-set: concurrent submissions race on the row, one wins.
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            UPDATE daily_logs SET
                satisfaction = $3,
                completed = true,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND mood IS NOT NULL AND satisfaction IS NULL
            RETURNING *
            "#,
        )
        .bind(log_id)
        .bind(user_id)
        .bind(satisfaction)
        .fetch_optional(&self.db)
        .await?;

        Ok(log)
    }

    async fn aggregate_count(
        &self,
        user_id: Uuid,
        range: DayRange,
        field: GroupField,
    ) -> AppResult<BTreeMap<String, i64>> {
        let sql = match field {
            GroupField::Mood => {
                r#"
                SELECT mood::text, COUNT(*) FROM daily_logs
                WHERE user_id = $1 AND log_date >= $2 AND log_date < $3 AND mood IS NOT NULL
                GROUP BY mood
                "#
            }
            GroupField::Satisfaction => {
                r#"
                SELECT satisfaction::text, COUNT(*) FROM daily_logs
                WHERE user_id = $1 AND log_date >= $2 AND log_date < $3 AND satisfaction IS NOT NULL
                GROUP BY satisfaction
                "#
            }
        };

        let rows = sqlx::query_as::<_, (String, i64)>(sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_ids(&self) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY created_at ASC")
            .fetch_all(&self.db)
            .await?;

        Ok(ids)
    }

    async fn inactive_since(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE last_active_at < $1 ORDER BY last_active_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn record_activity(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, last_active_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                last_active_at = EXCLUDED.last_active_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;

        Ok(created)
    }

    async fn list_unread(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND is_read = false
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
