use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Wire format of a due moment: local wall clock, no offset.
pub const REMIND_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const REMIND_AT_INPUT_FORMATS: [&str; 3] = [REMIND_AT_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn format_remind_at(at: &NaiveDateTime) -> String {
    at.format(REMIND_AT_FORMAT).to_string()
}

pub fn parse_remind_at(value: &str) -> Result<NaiveDateTime, AppError> {
    let value = value.trim();
    REMIND_AT_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| AppError::decode(format!("invalid remind_at: {:?}", value)))
}

/// Serde adapter pinning `remind_at` to [`REMIND_AT_FORMAT`].
pub mod remind_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_remind_at(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_remind_at(&raw).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Repeat {
    pub const ALL: [Repeat; 4] = [Repeat::Once, Repeat::Daily, Repeat::Weekly, Repeat::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            Repeat::Once => "once",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Repeat::Once => "Once",
            Repeat::Daily => "Every day",
            Repeat::Weekly => "Every week",
            Repeat::Monthly => "Every month",
        }
    }

    /// Next due moment after a firing at `at`. `None` for one-shot reminders.
    /// Monthly steps clamp to the last day of a shorter month.
    pub fn next_after(self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Repeat::Once => None,
            Repeat::Daily => at.checked_add_days(Days::new(1)),
            Repeat::Weekly => at.checked_add_days(Days::new(7)),
            Repeat::Monthly => at.checked_add_months(Months::new(1)),
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Repeat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Repeat::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AppError::decode(format!("unknown repeat kind: {:?}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub text: String,
    #[serde(with = "remind_at_format")]
    pub remind_at: NaiveDateTime,
    pub repeat: Repeat,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub sent: bool,
}

impl Reminder {
    /// Logically due: open, not yet dispatched for this due moment, and past it.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.done && !self.sent && self.remind_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub text: String,
    #[serde(with = "remind_at_format")]
    pub remind_at: NaiveDateTime,
    #[serde(default)]
    pub repeat: Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReminderRequest {
    pub id: i64,
    pub done: bool,
}
