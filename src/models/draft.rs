use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::reminder::{NewReminder, Repeat};

/// Pending creation form, kept as the raw strings the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub text: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub time: String,
    pub repeat: Repeat,
}

impl ReminderDraft {
    pub fn new(text: &str, date: &str, time: &str, repeat: Repeat) -> Self {
        Self {
            text: text.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            repeat,
        }
    }

    pub fn validate(&self) -> Result<NewReminder, AppError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Reminder text is required"));
        }

        let date = self.date.trim();
        if date.is_empty() {
            return Err(AppError::validation("Date is required"));
        }
        let time = self.time.trim();
        if time.is_empty() {
            return Err(AppError::validation("Time is required"));
        }

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::validation(format!("Invalid date: {}", date)))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|_| AppError::validation(format!("Invalid time: {}", time)))?;

        Ok(NewReminder {
            text: text.to_string(),
            remind_at: NaiveDateTime::new(date, time),
            repeat: self.repeat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_draft_combines_date_and_time() {
        let draft = ReminderDraft::new("  Buy milk ", "2026-03-01", "09:00", Repeat::Daily);
        let new = draft.validate().expect("draft should be valid");

        assert_eq!(new.text, "Buy milk");
        assert_eq!(crate::models::format_remind_at(&new.remind_at), "2026-03-01T09:00:00");
        assert_eq!(new.repeat, Repeat::Daily);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let draft = ReminderDraft::new(" \t ", "2026-03-01", "09:00", Repeat::Once);
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_date_or_time_is_rejected() {
        let no_date = ReminderDraft::new("Call Ivan", "", "10:00", Repeat::Once);
        assert!(matches!(no_date.validate(), Err(AppError::Validation(_))));

        let no_time = ReminderDraft::new("Call Ivan", "2026-02-22", "", Repeat::Once);
        assert!(matches!(no_time.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let draft = ReminderDraft::new("Call Ivan", "22.02.2026", "10:00", Repeat::Once);
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));

        let draft = ReminderDraft::new("Call Ivan", "2026-02-22", "25:00", Repeat::Once);
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
    }
}
