//! # Moodlog: Request/Response DTOs
//!
//! API contract types that are not domain models.
//!
//! Conventions:
//! - `*Request` → deserialized from client JSON body
//! - `*Query`   → deserialized from query params
//! - Field shape is checked with `validator`; vocabulary checks (mood,
//!   satisfaction) live in the services so every caller gets them.
//! - camelCase aliases are accepted for the tracker fields older clients send.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::daily_logs::{LogLookup, TrackerUpdate};
use crate::services::date_window::{DateWindow, DayRange};

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Daily logs
// ============================================================================

/// POST /api/moods/log
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitMoodRequest {
    pub mood: Option<String>,

    #[validate(length(max = 2000, message = "Thoughts must be at most 2000 characters"))]
    pub thoughts: Option<String>,
}

/// PATCH /api/moods/log/:id
#[derive(Debug, Deserialize)]
pub struct SubmitSatisfactionRequest {
    pub satisfaction: Option<String>,
}

/// PATCH /api/moods/log/:id/tracker
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTrackerRequest {
    #[serde(alias = "waterGlasses")]
    #[validate(range(min = 0, max = 100, message = "waterGlasses must be between 0 and 100"))]
    pub water_glasses: Option<i32>,

    #[serde(alias = "sleepHours")]
    #[validate(range(min = 0.0, max = 24.0, message = "sleepHours must be between 0 and 24"))]
    pub sleep_hours: Option<f64>,
}

impl From<UpdateTrackerRequest> for TrackerUpdate {
    fn from(req: UpdateTrackerRequest) -> Self {
        Self {
            water_glasses: req.water_glasses,
            sleep_hours: req.sleep_hours,
        }
    }
}

/// GET /api/moods/details?id=… or ?date=YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct LogDetailsQuery {
    pub id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

impl LogDetailsQuery {
    /// An id wins over a date when both are given.
    pub fn lookup(&self) -> AppResult<LogLookup> {
        match (self.id, self.date) {
            (Some(id), _) => Ok(LogLookup::Id(id)),
            (None, Some(date)) => Ok(LogLookup::Date(date)),
            (None, None) => Err(AppError::Validation(
                "Either a log id or a date is required".into(),
            )),
        }
    }
}

/// GET /api/moods?start_date&end_date (both inclusive)
#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DailyLogQuery {
    pub const DEFAULT_DAYS: i64 = 30;

    pub fn range(&self, window: &DateWindow) -> AppResult<DayRange> {
        let out_of_range = || AppError::Validation("Date is out of range".into());

        let end = self.end_date.unwrap_or_else(|| window.today());
        let start = match self.start_date {
            Some(start) => start,
            None => end
                .checked_sub_signed(Duration::days(Self::DEFAULT_DAYS))
                .ok_or_else(out_of_range)?,
        };
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".into(),
            ));
        }
        Ok(DayRange {
            start,
            end: end.succ_opt().ok_or_else(out_of_range)?,
        })
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// POST /api/notifications
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Body must be 1-2000 characters"))]
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::daily_logs::tests::fixed_window;

    #[test]
    fn test_tracker_request_accepts_camel_case() {
        let req: UpdateTrackerRequest =
            serde_json::from_str(r#"{"waterGlasses": 3, "sleepHours": 7.5}"#).unwrap();
        assert_eq!(req.water_glasses, Some(3));
        assert_eq!(req.sleep_hours, Some(7.5));
        assert!(req.validate().is_ok());

        let req: UpdateTrackerRequest = serde_json::from_str(r#"{"water_glasses": -2}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_tracker_request_is_empty_update() {
        let req: UpdateTrackerRequest = serde_json::from_str("{}").unwrap();
        assert!(TrackerUpdate::from(req).is_empty());
    }

    #[test]
    fn test_details_query_requires_id_or_date() {
        let q = LogDetailsQuery { id: None, date: None };
        assert!(q.lookup().is_err());

        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let q = LogDetailsQuery { id: None, date: Some(date) };
        assert!(matches!(q.lookup().unwrap(), LogLookup::Date(d) if d == date));
    }

    #[test]
    fn test_list_query_default_and_inclusive_range() {
        let window = fixed_window("2024-03-15T10:00:00Z");
        let q = DailyLogQuery { start_date: None, end_date: None };
        let range = q.range(&window).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));

        let q = DailyLogQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        assert!(q.range(&window).is_err());
    }

    #[test]
    fn test_list_query_at_calendar_limits_is_validation_error() {
        let window = fixed_window("2024-03-15T10:00:00Z");

        let q = DailyLogQuery { start_date: None, end_date: Some(NaiveDate::MIN) };
        assert_eq!(q.range(&window).unwrap_err().kind(), "validation_error");

        let q = DailyLogQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: Some(NaiveDate::MAX),
        };
        assert_eq!(q.range(&window).unwrap_err().kind(), "validation_error");
    }

    #[test]
    fn test_notification_request_validation() {
        let req = CreateNotificationRequest {
            title: String::new(),
            body: "hi".into(),
        };
        assert!(req.validate().is_err());
    }
}
