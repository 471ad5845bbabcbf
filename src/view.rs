use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::ReminderStore;
use crate::error::AppError;
use crate::filter::{FilterMode, project};
use crate::models::{MailboxId, Reminder, ReminderDraft, UpdateReminderRequest};

/// Everything the screen renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub mailbox: Option<MailboxId>,
    pub reminders: Vec<Reminder>,
    pub loading: bool,
    pub draft: ReminderDraft,
    pub filter: FilterMode,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The list was replaced with this many reminders.
    Applied(usize),
    /// No mailbox is bound; nothing was fetched.
    Unbound,
    /// A newer reload was issued while this one was in flight.
    Stale,
}

/// Client-side cache of one mailbox's reminders.
///
/// Mutations are applied to the local list first, sent to the store, and
/// followed by a full reload; a failed call rolls the local patch back.
/// Reloads are numbered and only the latest issued one may replace the list.
/// The state lock is never held across a store call, and nothing a call
/// started under one binding writes into the state of a later binding.
pub struct ViewController {
    store: Arc<dyn ReminderStore>,
    state: Mutex<ViewState>,
    reload_seq: AtomicU64,
    bind_epoch: AtomicU64,
}

impl ViewController {
    pub fn new(store: Arc<dyn ReminderStore>, mailbox: Option<MailboxId>) -> Self {
        Self {
            store,
            state: Mutex::new(ViewState {
                mailbox,
                ..ViewState::default()
            }),
            reload_seq: AtomicU64::new(0),
            bind_epoch: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn reminders(&self) -> Vec<Reminder> {
        self.state.lock().await.reminders.clone()
    }

    /// The list as displayed under the current filter.
    pub async fn visible(&self) -> Vec<Reminder> {
        let state = self.state.lock().await;
        project(&state.reminders, state.filter).into_iter().cloned().collect()
    }

    pub async fn set_filter(&self, filter: FilterMode) {
        self.state.lock().await.filter = filter;
    }

    pub async fn set_draft(&self, draft: ReminderDraft) {
        self.state.lock().await.draft = draft;
    }

    /// Switches to another mailbox (or none). The old list is dropped, never
    /// merged, and calls still in flight for the old mailbox are ignored.
    pub async fn rebind(&self, mailbox: Option<MailboxId>) -> Result<ReloadOutcome, AppError> {
        {
            let mut state = self.state.lock().await;
            match &mailbox {
                Some(id) => info!("view bound to mailbox {}", id),
                None => info!("view unbound"),
            }
            state.mailbox = mailbox;
            state.reminders.clear();
            state.loading = false;
            state.error = None;
            self.bind_epoch.fetch_add(1, Ordering::SeqCst);
            self.reload_seq.fetch_add(1, Ordering::SeqCst);
        }
        self.reload().await
    }

    pub async fn reload(&self) -> Result<ReloadOutcome, AppError> {
        let (seq, mailbox) = {
            let mut state = self.state.lock().await;
            let seq = self.reload_seq.fetch_add(1, Ordering::SeqCst) + 1;
            let Some(mailbox) = state.mailbox.clone() else {
                state.reminders.clear();
                state.loading = false;
                return Ok(ReloadOutcome::Unbound);
            };
            state.loading = true;
            (seq, mailbox)
        };

        debug!("reload #{} for mailbox {}", seq, mailbox);
        let result = self.store.list(&mailbox).await;

        let mut state = self.state.lock().await;
        if self.reload_seq.load(Ordering::SeqCst) != seq {
            debug!("discarding stale reload #{}", seq);
            return Ok(ReloadOutcome::Stale);
        }
        state.loading = false;

        match result {
            Ok(reminders) => {
                let count = reminders.len();
                state.reminders = reminders;
                state.error = None;
                Ok(ReloadOutcome::Applied(count))
            }
            Err(e) => {
                warn!("reload #{} failed, keeping {} cached reminders: {}", seq, state.reminders.len(), e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Validates the draft and creates it. An invalid draft never reaches the store.
    pub async fn submit_create(&self) -> Result<ReloadOutcome, AppError> {
        let (epoch, mailbox, new) = {
            let mut state = self.state.lock().await;
            let (epoch, mailbox) = self.bound_mailbox(&mut state)?;
            match state.draft.validate() {
                Ok(new) => (epoch, mailbox, new),
                Err(e) => {
                    state.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        if let Err(e) = self.store.create(&mailbox, &new).await {
            return Err(self.record_error(epoch, e).await);
        }
        info!("created reminder due {} for {}", new.remind_at, mailbox);

        let rebound = !self
            .patch_if_bound(epoch, |state| {
                state.draft = ReminderDraft::default();
                state.error = None;
            })
            .await;
        if rebound {
            return Ok(ReloadOutcome::Stale);
        }
        self.reload().await
    }

    pub async fn toggle_done(&self, id: i64) -> Result<ReloadOutcome, AppError> {
        let (epoch, mailbox, done) = {
            let mut state = self.state.lock().await;
            let (epoch, mailbox) = self.bound_mailbox(&mut state)?;
            let Some(index) = state.reminders.iter().position(|r| r.id == id) else {
                let e = AppError::NotFound;
                state.error = Some(e.to_string());
                return Err(e);
            };
            let reminder = &mut state.reminders[index];
            reminder.done = !reminder.done;
            (epoch, mailbox, reminder.done)
        };

        let request = UpdateReminderRequest { id, done };
        if let Err(e) = self.store.update(&mailbox, &request).await {
            let still_bound = self
                .patch_if_bound(epoch, |state| {
                    if let Some(reminder) = state.reminders.iter_mut().find(|r| r.id == id && r.done == done) {
                        reminder.done = !done;
                    }
                })
                .await;
            if still_bound && matches!(e, AppError::NotFound) {
                // gone from the store: bring the cache back in line
                let _ = self.reload().await;
            }
            return Err(self.record_error(epoch, e).await);
        }

        self.reload().await
    }

    /// Removing an id the store does not have is not an error.
    pub async fn remove(&self, id: i64) -> Result<ReloadOutcome, AppError> {
        let (epoch, mailbox, removed) = {
            let mut state = self.state.lock().await;
            let (epoch, mailbox) = self.bound_mailbox(&mut state)?;
            let removed = state
                .reminders
                .iter()
                .position(|r| r.id == id)
                .map(|index| (index, state.reminders.remove(index)));
            (epoch, mailbox, removed)
        };

        if let Err(e) = self.store.delete(&mailbox, id).await {
            let message = e.to_string();
            self.patch_if_bound(epoch, move |state| {
                if let Some((index, reminder)) = removed {
                    if !state.reminders.iter().any(|r| r.id == id) {
                        let index = index.min(state.reminders.len());
                        state.reminders.insert(index, reminder);
                    }
                }
                state.error = Some(message);
            })
            .await;
            return Err(e);
        }

        self.reload().await
    }

    /// Applies `patch` only while the binding taken at `epoch` is still current.
    async fn patch_if_bound(&self, epoch: u64, patch: impl FnOnce(&mut ViewState)) -> bool {
        let mut state = self.state.lock().await;
        if self.bind_epoch.load(Ordering::SeqCst) != epoch {
            debug!("dropping result of a call made under a previous binding");
            return false;
        }
        patch(&mut state);
        true
    }

    async fn record_error(&self, epoch: u64, e: AppError) -> AppError {
        let message = e.to_string();
        self.patch_if_bound(epoch, |state| state.error = Some(message)).await;
        e
    }

    /// The current binding and its epoch, read under the state lock.
    fn bound_mailbox(&self, state: &mut ViewState) -> Result<(u64, MailboxId), AppError> {
        match &state.mailbox {
            Some(mailbox) => Ok((self.bind_epoch.load(Ordering::SeqCst), mailbox.clone())),
            None => {
                let e = AppError::validation("No mailbox is bound");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
