//! Lifecycle of a day's entry: mood, then satisfaction (once), then any
//! number of tracker updates.

use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::daily_log::{DailyLog, LogState, Mood, Satisfaction, TrackerNote};
use crate::repository::{LogRepository, NewDailyLog, SortOrder};
use crate::services::date_window::{DateWindow, DayRange};
use crate::services::text_gen::{Enrichment, TextGenerator};

pub const MAX_SLEEP_HOURS: f64 = 24.0;

/// How a tracker value in an update combines with the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackerPolicy {
    #[default]
    Overwrite,
    Increment,
}

impl FromStr for TrackerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "increment" => Ok(Self::Increment),
            other => Err(format!("Unknown tracker policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerUpdate {
    pub water_glasses: Option<i32>,
    pub sleep_hours: Option<f64>,
}

impl TrackerUpdate {
    pub fn is_empty(&self) -> bool {
        self.water_glasses.is_none() && self.sleep_hours.is_none()
    }
}

fn sleep_limit_error() -> AppError {
    AppError::Validation(format!(
        "sleepHours cannot exceed {} per day",
        MAX_SLEEP_HOURS
    ))
}

#[derive(Debug, Clone, Copy)]
pub enum LogLookup {
    Id(Uuid),
    Date(NaiveDate),
}

/// A log with its tracker notes computed at read time.
#[derive(Debug, Serialize)]
pub struct TrackedLog {
    #[serde(flatten)]
    pub log: DailyLog,
    pub water_note: TrackerNote,
    pub sleep_note: TrackerNote,
}

impl From<DailyLog> for TrackedLog {
    fn from(log: DailyLog) -> Self {
        Self {
            water_note: log.water_note(),
            sleep_note: log.sleep_note(),
            log,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WaterReading {
    pub glasses: i32,
    pub note: TrackerNote,
}

#[derive(Debug, Serialize)]
pub struct SleepReading {
    pub hours: f64,
    pub note: TrackerNote,
}

#[derive(Debug, Serialize)]
pub struct EnrichmentError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LogDetails {
    #[serde(flatten)]
    pub log: DailyLog,
    pub state: LogState,
    pub emoji: Option<&'static str>,
    pub tone: Option<&'static str>,
    pub water: WaterReading,
    pub sleep: SleepReading,
    pub enrichment: Option<Enrichment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<EnrichmentError>,
}

#[derive(Clone)]
pub struct DailyLogService {
    logs: Arc<dyn LogRepository>,
    window: DateWindow,
    policy: TrackerPolicy,
    text_gen: Option<Arc<dyn TextGenerator>>,
}

impl DailyLogService {
    pub fn new(
        logs: Arc<dyn LogRepository>,
        window: DateWindow,
        policy: TrackerPolicy,
        text_gen: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            logs,
            window,
            policy,
            text_gen,
        }
    }

    /// Empty -> MoodSubmitted for today's log.
    pub async fn submit_mood(
        &self,
        user_id: Uuid,
        mood: Option<&str>,
        thoughts: Option<String>,
    ) -> AppResult<DailyLog> {
        let mood = mood
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Invalid or missing mood".into()))?
            .parse::<Mood>()
            .map_err(AppError::Validation)?;
        let thoughts = thoughts
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let today = self.window.today();
        if self
            .logs
            .find_by_user_and_date(user_id, self.window.day_range(today)?)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Mood already submitted for today".into()));
        }

        // A concurrent submission that slips past the check above still
        // loses at the unique constraint and surfaces as Conflict.
        let log = self
            .logs
            .create(NewDailyLog {
                user_id,
                log_date: today,
                mood: Some(mood),
                thoughts,
            })
            .await?;

        tracing::info!(user_id = %user_id, log_id = %log.id, mood = %mood, "Mood submitted");
        Ok(log)
    }

    /// MoodSubmitted -> SatisfactionSubmitted. Satisfaction is write-once.
    pub async fn submit_satisfaction(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        satisfaction: Option<&str>,
    ) -> AppResult<DailyLog> {
        let satisfaction = satisfaction
            .ok_or_else(|| AppError::Validation("Invalid satisfaction level".into()))?
            .parse::<Satisfaction>()
            .map_err(|_| AppError::Validation("Invalid satisfaction level".into()))?;

        if let Some(log) = self
            .logs
            .set_satisfaction_if_unset(user_id, log_id, satisfaction)
            .await?
        {
            tracing::info!(
                user_id = %user_id,
                log_id = %log.id,
                satisfaction = %satisfaction,
                "Satisfaction submitted"
            );
            return Ok(log);
        }

        // The compare-and-set matched nothing; work out why.
        let existing = self
            .logs
            .find_by_id(user_id, log_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Mood not found".into()))?;

        match existing.state() {
            LogState::Empty => Err(AppError::Conflict(
                "Submit a mood before satisfaction".into(),
            )),
            _ => Err(AppError::Conflict("Satisfaction already submitted".into())),
        }
    }

    pub async fn update_tracker(
        &self,
        user_id: Uuid,
        log_id: Uuid,
        update: TrackerUpdate,
    ) -> AppResult<TrackedLog> {
        if update.water_glasses.is_some_and(|w| w < 0) {
            return Err(AppError::Validation("waterGlasses must not be negative".into()));
        }
        if update.sleep_hours.is_some_and(|s| !s.is_finite() || s < 0.0) {
            return Err(AppError::Validation("sleepHours must not be negative".into()));
        }

        if update.sleep_hours.is_some_and(|s| s > MAX_SLEEP_HOURS) {
            return Err(sleep_limit_error());
        }

        if update.is_empty() {
            let log = self.require_mood(user_id, log_id).await?;
            return Ok(log.into());
        }

        if let Some(saved) = self
            .logs
            .apply_trackers(user_id, log_id, update, self.policy)
            .await?
        {
            tracing::debug!(
                user_id = %user_id,
                log_id = %saved.id,
                water_glasses = saved.water_glasses,
                sleep_hours = saved.sleep_hours,
                "Trackers updated"
            );
            return Ok(saved.into());
        }

        // Nothing was written; the log is missing, has no mood, or the
        // accumulated totals would pass the daily limit.
        self.require_mood(user_id, log_id).await?;
        Err(sleep_limit_error())
    }

    async fn require_mood(&self, user_id: Uuid, log_id: Uuid) -> AppResult<DailyLog> {
        let log = self
            .logs
            .find_by_id(user_id, log_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Log not found".into()))?;

        if log.state() == LogState::Empty {
            return Err(AppError::Conflict(
                "Submit a mood before updating trackers".into(),
            ));
        }
        Ok(log)
    }

    pub async fn log_details(&self, user_id: Uuid, lookup: LogLookup) -> AppResult<LogDetails> {
        let log = match lookup {
            LogLookup::Id(id) => self.logs.find_by_id(user_id, id).await?,
            LogLookup::Date(date) => {
                self.logs
                    .find_by_user_and_date(user_id, self.window.day_range(date)?)
                    .await?
            }
        }
        .ok_or_else(|| AppError::NotFound("No mood log found".into()))?;

        let (enrichment, enrichment_error) = match self.enrich(&log).await {
            Ok(enrichment) => (enrichment, None),
            Err(e) => (
                None,
                Some(EnrichmentError {
                    kind: e.kind(),
                    message: e.public_message(),
                }),
            ),
        };

        Ok(LogDetails {
            state: log.state(),
            emoji: log.mood.map(|m| m.emoji()),
            tone: log.satisfaction.map(|s| s.tone()),
            water: WaterReading {
                glasses: log.water_glasses,
                note: log.water_note(),
            },
            sleep: SleepReading {
                hours: log.sleep_hours,
                note: log.sleep_note(),
            },
            enrichment,
            enrichment_error,
            log,
        })
    }

    /// Newest first.
    pub async fn list_logs(&self, user_id: Uuid, range: DayRange) -> AppResult<Vec<DailyLog>> {
        self.logs
            .find_by_user_in_range(user_id, range, SortOrder::Descending)
            .await
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    async fn enrich(&self, log: &DailyLog) -> AppResult<Option<Enrichment>> {
        let (Some(text_gen), Some(mood)) = (&self.text_gen, log.mood) else {
            return Ok(None);
        };

        let (motivation, title) = tokio::try_join!(
            text_gen.motivation(mood),
            text_gen.title(mood, log.satisfaction)
        )?;

        Ok(Some(Enrichment { title, motivation }))
    }
}
