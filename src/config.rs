use chrono::{FixedOffset, NaiveTime};
use std::env;

use crate::services::daily_logs::TrackerPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,

    /// Offset of the deployment's reference time zone; every day boundary uses it.
    pub utc_offset_minutes: i32,
    pub tracker_policy: TrackerPolicy,

    pub claude_api_key: String,
    pub claude_model: String,
    pub enrichment_timeout_secs: u64,

    // Background jobs
    pub reconcile_at: NaiveTime,
    pub reminder_interval_secs: u64,
    pub reminder_inactive_hours: i64,
    pub job_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            utc_offset_minutes: env::var("UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .unwrap_or(0),
            tracker_policy: env::var("TRACKER_UPDATE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),

            claude_api_key: env::var("CLAUDE_API_KEY").unwrap_or_else(|_| String::new()),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
            enrichment_timeout_secs: env::var("ENRICHMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            reconcile_at: env::var("RECONCILE_AT")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(default_reconcile_at),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .unwrap_or(3600),
            reminder_inactive_hours: env::var("REMINDER_INACTIVE_HOURS")
                .unwrap_or_else(|_| "6".into())
                .parse()
                .unwrap_or(6),
            job_concurrency: env::var("JOB_CONCURRENCY")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(4),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Out-of-range offsets collapse to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    pub fn enrichment_enabled(&self) -> bool {
        !self.claude_api_key.is_empty()
    }
}

fn default_reconcile_at() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).expect("23:59 is a valid time")
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/moodlog_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret".into(),
            utc_offset_minutes: 0,
            tracker_policy: TrackerPolicy::Overwrite,
            claude_api_key: String::new(),
            claude_model: "test-model".into(),
            enrichment_timeout_secs: 1,
            reconcile_at: default_reconcile_at(),
            reminder_interval_secs: 3600,
            reminder_inactive_hours: 6,
            job_concurrency: 2,
        }
    }
}
