use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Reminder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Done,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::All, FilterMode::Active, FilterMode::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "All",
            FilterMode::Active => "Active",
            FilterMode::Done => "Completed",
        }
    }

    pub fn matches(self, reminder: &Reminder) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !reminder.done,
            FilterMode::Done => reminder.done,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown filter: {}", s)))
    }
}

/// Display subset of `list` for `mode`, in the original order.
pub fn project(list: &[Reminder], mode: FilterMode) -> Vec<&Reminder> {
    list.iter().filter(|r| mode.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Repeat, parse_remind_at};
    use proptest::prelude::*;

    fn reminder(id: i64, done: bool) -> Reminder {
        Reminder {
            id,
            text: format!("reminder {}", id),
            remind_at: parse_remind_at("2026-02-21T09:00:00").unwrap(),
            repeat: Repeat::Once,
            done,
            sent: false,
        }
    }

    #[test]
    fn test_done_and_active_split_two_reminders() {
        let list = vec![reminder(1, true), reminder(2, false)];

        let done: Vec<i64> = project(&list, FilterMode::Done).iter().map(|r| r.id).collect();
        let active: Vec<i64> = project(&list, FilterMode::Active).iter().map(|r| r.id).collect();

        assert_eq!(done, vec![1]);
        assert_eq!(active, vec![2]);
    }

    #[test]
    fn test_filter_mode_names() {
        for mode in FilterMode::ALL {
            assert_eq!(mode.as_str().parse::<FilterMode>().unwrap(), mode);
        }
        assert!("archived".parse::<FilterMode>().is_err());
    }

    proptest! {
        #[test]
        fn prop_all_is_identity(flags in proptest::collection::vec(any::<bool>(), 0..32)) {
            let list: Vec<Reminder> = flags.iter().enumerate().map(|(i, d)| reminder(i as i64, *d)).collect();
            let all: Vec<Reminder> = project(&list, FilterMode::All).into_iter().cloned().collect();
            prop_assert_eq!(all, list);
        }

        #[test]
        fn prop_active_and_done_partition_in_order(flags in proptest::collection::vec(any::<bool>(), 0..32)) {
            let list: Vec<Reminder> = flags.iter().enumerate().map(|(i, d)| reminder(i as i64, *d)).collect();
            let active = project(&list, FilterMode::Active);
            let done = project(&list, FilterMode::Done);

            prop_assert_eq!(active.len() + done.len(), list.len());
            prop_assert!(active.iter().all(|r| !r.done));
            prop_assert!(done.iter().all(|r| r.done));

            // both halves keep the input order
            prop_assert!(active.windows(2).all(|w| w[0].id < w[1].id));
            prop_assert!(done.windows(2).all(|w| w[0].id < w[1].id));
        }
    }
}
