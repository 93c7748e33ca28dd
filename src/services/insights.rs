//! Derived views over a user's recent logs.
//!
//! Logs without a mood (nightly placeholders) appear in the timelines but are
//! never counted in a histogram.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::daily_log::{DailyLog, Mood, Satisfaction};
use crate::repository::{GroupField, LogRepository, SortOrder};
use crate::services::date_window::DateWindow;

pub const WEEK_DAYS: i64 = 7;
pub const MONTH_DAYS: i64 = 30;

#[derive(Debug, Serialize, PartialEq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub mood: Option<Mood>,
}

#[derive(Debug, Serialize)]
pub struct LabeledLog {
    pub id: Uuid,
    pub day: String,
    pub date: NaiveDate,
    pub mood: Option<Mood>,
    pub emoji: Option<&'static str>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TopMood {
    pub mood: Mood,
    pub count: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WeeklyMoodSummary {
    pub total_days: u32,
    pub mood_counts: BTreeMap<Mood, u32>,
    pub top_mood: TopMood,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SatisfactionDays {
    pub name: Satisfaction,
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyInsights {
    pub mood_counts: BTreeMap<String, i64>,
    /// Always all four levels, in canonical order.
    pub satisfaction: Vec<SatisfactionDays>,
}

#[derive(Clone)]
pub struct InsightsService {
    logs: Arc<dyn LogRepository>,
    window: DateWindow,
}

impl InsightsService {
    pub fn new(logs: Arc<dyn LogRepository>, window: DateWindow) -> Self {
        Self { logs, window }
    }

    /// Last seven days plus today, oldest first.
    pub async fn seven_day_timeline(&self, user_id: Uuid) -> AppResult<Vec<TimelinePoint>> {
        let logs = self
            .logs
            .find_by_user_in_range(user_id, self.window.trailing(WEEK_DAYS), SortOrder::Ascending)
            .await?;

        Ok(logs
            .into_iter()
            .map(|log| TimelinePoint {
                date: log.log_date,
                mood: log.mood,
            })
            .collect())
    }

    /// Same window, newest first, labelled Today / Yesterday / weekday.
    pub async fn weekly_labeled_logs(&self, user_id: Uuid) -> AppResult<Vec<LabeledLog>> {
        let logs = self
            .logs
            .find_by_user_in_range(user_id, self.window.trailing(WEEK_DAYS), SortOrder::Descending)
            .await?;

        Ok(logs
            .into_iter()
            .map(|log| LabeledLog {
                id: log.id,
                day: self.window.label(log.log_date),
                date: log.log_date,
                mood: log.mood,
                emoji: log.mood.map(|m| m.emoji()),
            })
            .collect())
    }

    /// `None` when the week has no submitted mood.
    pub async fn weekly_mode_summary(&self, user_id: Uuid) -> AppResult<Option<WeeklyMoodSummary>> {
        let logs = self
            .logs
            .find_by_user_in_range(user_id, self.window.trailing(WEEK_DAYS), SortOrder::Ascending)
            .await?;

        Ok(mood_mode(&logs))
    }

    pub async fn monthly_histogram(&self, user_id: Uuid) -> AppResult<MonthlyInsights> {
        let range = self.window.trailing(MONTH_DAYS);
        let (mood_counts, satisfaction_counts) = tokio::try_join!(
            self.logs.aggregate_count(user_id, range, GroupField::Mood),
            self.logs
                .aggregate_count(user_id, range, GroupField::Satisfaction)
        )?;

        let satisfaction = Satisfaction::ALL
            .iter()
            .map(|level| SatisfactionDays {
                name: *level,
                days: satisfaction_counts
                    .get(level.as_str())
                    .copied()
                    .unwrap_or(0),
            })
            .collect();

        Ok(MonthlyInsights {
            mood_counts,
            satisfaction,
        })
    }
}

/// Counts moods in `logs` (expected oldest first) and picks the most frequent.
/// Ties go to the mood that appeared first.
pub fn mood_mode(logs: &[DailyLog]) -> Option<WeeklyMoodSummary> {
    let mut mood_counts: BTreeMap<Mood, u32> = BTreeMap::new();
    let mut first_seen: Vec<Mood> = Vec::new();

    for mood in logs.iter().filter_map(|log| log.mood) {
        let count = mood_counts.entry(mood).or_insert(0);
        if *count == 0 {
            first_seen.push(mood);
        }
        *count += 1;
    }

    let mut top: Option<TopMood> = None;
    for mood in first_seen {
        let count = mood_counts[&mood];
        if top.as_ref().map_or(true, |t| count > t.count) {
            top = Some(TopMood { mood, count });
        }
    }

    top.map(|top_mood| WeeklyMoodSummary {
        total_days: mood_counts.values().sum(),
        mood_counts,
        top_mood,
    })
}
