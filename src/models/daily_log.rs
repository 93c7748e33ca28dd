use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Water glasses / sleep hours at or above this are a "Good" day.
pub const TRACKER_GOOD_THRESHOLD: f64 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub mood: Option<Mood>,
    pub thoughts: Option<String>,
    pub satisfaction: Option<Satisfaction>,
    pub water_glasses: i32,
    pub sleep_hours: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyLog {
    pub fn state(&self) -> LogState {
        match (&self.mood, &self.satisfaction) {
            (None, _) => LogState::Empty,
            (Some(_), None) => LogState::MoodSubmitted,
            (Some(_), Some(_)) => LogState::SatisfactionSubmitted,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.mood.is_some() && self.satisfaction.is_some()
    }

    pub fn water_note(&self) -> TrackerNote {
        TrackerNote::classify(self.water_glasses as f64)
    }

    pub fn sleep_note(&self) -> TrackerNote {
        TrackerNote::classify(self.sleep_hours)
    }
}

/// Lifecycle of a single day's entry.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogState {
    Empty,
    MoodSubmitted,
    SatisfactionSubmitted,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TrackerNote {
    Good,
    Bad,
}

impl TrackerNote {
    pub fn classify(value: f64) -> Self {
        if value >= TRACKER_GOOD_THRESHOLD {
            Self::Good
        } else {
            Self::Bad
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "mood_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Romantic,
    Excited,
    Weird,
    Hopeful,
    Sleepy,
    Stressed,
    Angry,
    Neutral,
    Sad,
    Relaxed,
    Motivated,
    Inspired,
    Creative,
    Thoughtful,
    Reflective,
    Pensive,
    Dreamy,
    Nostalgic,
    Emotional,
    Anxious,
    Confused,
    Frustrated,
    Silly,
    Curious,
    Adventurous,
}

impl Mood {
    pub const ALL: [Mood; 26] = [
        Mood::Happy,
        Mood::Romantic,
        Mood::Excited,
        Mood::Weird,
        Mood::Hopeful,
        Mood::Sleepy,
        Mood::Stressed,
        Mood::Angry,
        Mood::Neutral,
        Mood::Sad,
        Mood::Relaxed,
        Mood::Motivated,
        Mood::Inspired,
        Mood::Creative,
        Mood::Thoughtful,
        Mood::Reflective,
        Mood::Pensive,
        Mood::Dreamy,
        Mood::Nostalgic,
        Mood::Emotional,
        Mood::Anxious,
        Mood::Confused,
        Mood::Frustrated,
        Mood::Silly,
        Mood::Curious,
        Mood::Adventurous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Romantic => "romantic",
            Mood::Excited => "excited",
            Mood::Weird => "weird",
            Mood::Hopeful => "hopeful",
            Mood::Sleepy => "sleepy",
            Mood::Stressed => "stressed",
            Mood::Angry => "angry",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Relaxed => "relaxed",
            Mood::Motivated => "motivated",
            Mood::Inspired => "inspired",
            Mood::Creative => "creative",
            Mood::Thoughtful => "thoughtful",
            Mood::Reflective => "reflective",
            Mood::Pensive => "pensive",
            Mood::Dreamy => "dreamy",
            Mood::Nostalgic => "nostalgic",
            Mood::Emotional => "emotional",
            Mood::Anxious => "anxious",
            Mood::Confused => "confused",
            Mood::Frustrated => "frustrated",
            Mood::Silly => "silly",
            Mood::Curious => "curious",
            Mood::Adventurous => "adventurous",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Romantic => "❤️",
            Mood::Excited => "🤩",
            Mood::Weird => "🤪",
            Mood::Hopeful => "🌈",
            Mood::Sleepy => "😴",
            Mood::Stressed => "😫",
            Mood::Angry => "😡",
            Mood::Neutral => "😐",
            Mood::Sad => "😢",
            Mood::Relaxed => "😌",
            Mood::Motivated => "💪",
            Mood::Inspired => "✨",
            Mood::Creative => "🎨",
            Mood::Thoughtful => "🤔",
            Mood::Reflective => "🪞",
            Mood::Pensive => "😔",
            Mood::Dreamy => "🌙",
            Mood::Nostalgic => "🕰️",
            Mood::Emotional => "😭",
            Mood::Anxious => "😰",
            Mood::Confused => "😕",
            Mood::Frustrated => "😤",
            Mood::Silly => "🤡",
            Mood::Curious => "🧐",
            Mood::Adventurous => "🏞️",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    /// Accepts `happy`, `Happy` and the emoji-prefixed `😊 Happy`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .trim()
            .trim_start_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();

        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| format!("Unknown mood: {}", s.trim()))
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "satisfaction_level")]
pub enum Satisfaction {
    #[sqlx(rename = "Very good")]
    #[serde(rename = "Very good")]
    VeryGood,
    #[sqlx(rename = "Good")]
    #[serde(rename = "Good")]
    Good,
    #[sqlx(rename = "Not so good")]
    #[serde(rename = "Not so good")]
    NotSoGood,
    #[sqlx(rename = "Not good at all")]
    #[serde(rename = "Not good at all")]
    NotGoodAtAll,
}

impl Satisfaction {
    pub const ALL: [Satisfaction; 4] = [
        Satisfaction::VeryGood,
        Satisfaction::Good,
        Satisfaction::NotSoGood,
        Satisfaction::NotGoodAtAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Satisfaction::VeryGood => "Very good",
            Satisfaction::Good => "Good",
            Satisfaction::NotSoGood => "Not so good",
            Satisfaction::NotGoodAtAll => "Not good at all",
        }
    }

    /// Display tone shown alongside a log's details.
    pub fn tone(&self) -> &'static str {
        match self {
            Satisfaction::VeryGood => "Gentle",
            Satisfaction::Good => "Balanced",
            Satisfaction::NotSoGood => "Sad",
            Satisfaction::NotGoodAtAll => "Restore",
        }
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Satisfaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Satisfaction::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| format!("Unknown satisfaction level: {}", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(mood: Option<Mood>, satisfaction: Option<Satisfaction>) -> DailyLog {
        let now = Utc::now();
        DailyLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            log_date: now.date_naive(),
            mood,
            thoughts: None,
            satisfaction,
            water_glasses: 0,
            sleep_hours: 0.0,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_mood_parses_plain_and_emoji_labels() {
        assert_eq!("happy".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!("Adventurous".parse::<Mood>().unwrap(), Mood::Adventurous);
        assert_eq!("😊 Happy".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!("🕰️ Nostalgic".parse::<Mood>().unwrap(), Mood::Nostalgic);
        assert!("grumpy".parse::<Mood>().is_err());
        assert!("".parse::<Mood>().is_err());
    }

    #[test]
    fn test_satisfaction_labels_roundtrip_through_serde() {
        let json = serde_json::to_string(&Satisfaction::NotGoodAtAll).unwrap();
        assert_eq!(json, "\"Not good at all\"");
        assert_eq!("not so good".parse::<Satisfaction>().unwrap(), Satisfaction::NotSoGood);
        assert!("Great".parse::<Satisfaction>().is_err());
    }

    #[test]
    fn test_state_follows_submitted_fields() {
        assert_eq!(log(None, None).state(), LogState::Empty);
        assert_eq!(log(Some(Mood::Sad), None).state(), LogState::MoodSubmitted);
        let done = log(Some(Mood::Sad), Some(Satisfaction::Good));
        assert_eq!(done.state(), LogState::SatisfactionSubmitted);
        assert!(done.is_complete());
    }

    #[test]
    fn test_tracker_note_threshold() {
        assert_eq!(TrackerNote::classify(8.0), TrackerNote::Good);
        assert_eq!(TrackerNote::classify(7.5), TrackerNote::Bad);
        let mut l = log(Some(Mood::Happy), None);
        l.water_glasses = 9;
        l.sleep_hours = 6.0;
        assert_eq!(l.water_note(), TrackerNote::Good);
        assert_eq!(l.sleep_note(), TrackerNote::Bad);
    }
}
