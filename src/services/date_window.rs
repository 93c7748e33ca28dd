//! Day-aligned time arithmetic.
//!
//! Every "today", window and label in the service is computed here, in the
//! single reference offset configured for the deployment. Dates are calendar
//! days (`NaiveDate`), so comparisons never depend on the time of day.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Half-open range of calendar days: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Clone)]
pub struct DateWindow {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl DateWindow {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local midnight of the day containing `instant`, as a UTC instant.
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = self.local_date(instant).and_time(NaiveTime::MIN);
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(instant)
    }

    pub fn days_ago(&self, n: i64) -> NaiveDate {
        self.today() - Duration::days(n)
    }

    /// Fails for the last representable date, which has no following day.
    pub fn day_range(&self, date: NaiveDate) -> AppResult<DayRange> {
        let end = date
            .succ_opt()
            .ok_or_else(|| AppError::Validation("Date is out of range".into()))?;
        Ok(DayRange { start: date, end })
    }

    /// `[days_ago(days), tomorrow)`: the last `days` days plus today.
    pub fn trailing(&self, days: i64) -> DayRange {
        DayRange {
            start: self.days_ago(days),
            end: self.today() + Duration::days(1),
        }
    }

    pub fn label(&self, date: NaiveDate) -> String {
        day_label(self.today(), date)
    }

    /// Time until the next local occurrence of `at`, strictly in the future.
    pub fn until_next(&self, at: NaiveTime) -> std::time::Duration {
        let now = self.now();
        let mut next = self.start_of_day(now) + (at - NaiveTime::MIN);
        if next <= now {
            next += Duration::days(1);
        }
        (next - now).to_std().unwrap_or_default()
    }
}

/// "Today", "Yesterday", else the weekday name. Uses calendar-day difference.
pub fn day_label(today: NaiveDate, date: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        _ => date.format("%A").to_string(),
    }
}
