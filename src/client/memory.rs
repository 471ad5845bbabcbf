use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::ReminderStore;
use crate::error::AppError;
use crate::models::{MailboxId, NewReminder, Reminder, Repeat, UpdateReminderRequest, parse_remind_at};

struct InMemoryState {
    next_id: i64,
    mailboxes: HashMap<MailboxId, Vec<Reminder>>,
}

/// Process-local store for demo mode and tests. New reminders are prepended,
/// so lists come back newest first.
pub struct InMemoryReminderStore {
    state: RwLock<InMemoryState>,
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InMemoryState {
                next_id: 1,
                mailboxes: HashMap::new(),
            }),
        }
    }

    /// Seeds `mailbox` with `reminders` as-is; later ids continue past the largest one.
    pub fn with_reminders(mailbox: MailboxId, reminders: Vec<Reminder>) -> Self {
        let next_id = reminders.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut mailboxes = HashMap::new();
        mailboxes.insert(mailbox, reminders);
        Self {
            state: RwLock::new(InMemoryState { next_id, mailboxes }),
        }
    }

    /// Store preloaded with a few sample reminders for `mailbox`.
    pub fn demo(mailbox: MailboxId) -> Result<Self, AppError> {
        let sample = |id: i64, text: &str, remind_at: &str, repeat: Repeat, done: bool| -> Result<Reminder, AppError> {
            Ok(Reminder {
                id,
                text: text.to_string(),
                remind_at: parse_remind_at(remind_at)?,
                repeat,
                done,
                sent: false,
            })
        };

        let reminders = vec![
            sample(1, "Call Ivan about the contract", "2026-02-22T10:00:00", Repeat::Once, false)?,
            sample(2, "Send the weekly report", "2026-02-21T18:00:00", Repeat::Weekly, false)?,
            sample(3, "Drink water", "2026-02-21T09:00:00", Repeat::Daily, true)?,
        ];
        Ok(Self::with_reminders(mailbox, reminders))
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn list(&self, mailbox: &MailboxId) -> Result<Vec<Reminder>, AppError> {
        let state = self.state.read().await;
        Ok(state.mailboxes.get(mailbox).cloned().unwrap_or_default())
    }

    async fn create(&self, mailbox: &MailboxId, reminder: &NewReminder) -> Result<(), AppError> {
        let text = reminder.text.trim();
        if text.is_empty() {
            return Err(AppError::validation("text and remind_at required"));
        }

        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        state.mailboxes.entry(mailbox.clone()).or_default().insert(
            0,
            Reminder {
                id,
                text: text.to_string(),
                remind_at: reminder.remind_at,
                repeat: reminder.repeat,
                done: false,
                sent: false,
            },
        );
        Ok(())
    }

    async fn update(&self, mailbox: &MailboxId, request: &UpdateReminderRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let reminder = state
            .mailboxes
            .get_mut(mailbox)
            .and_then(|list| list.iter_mut().find(|r| r.id == request.id))
            .ok_or(AppError::NotFound)?;
        reminder.done = request.done;
        Ok(())
    }

    async fn delete(&self, mailbox: &MailboxId, id: i64) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if let Some(list) = state.mailboxes.get_mut(mailbox) {
            list.retain(|r| r.id != id);
        }
        Ok(())
    }
}
