use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::MailboxId;

const IDENTITY_FILE: &str = "identity.json";

/// Durable single-key slot holding the bound mailbox id.
pub trait MailboxSlot: Send + Sync {
    fn load(&self) -> Result<Option<String>, AppError>;
    fn store(&self, mailbox_id: &str) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityRecord {
    mailbox_id: String,
}

/// JSON file under the application data directory.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(IDENTITY_FILE),
        }
    }

    /// `<data dir>/reminders/identity.json`
    pub fn in_default_location() -> Result<Self, AppError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| AppError::Config("no platform data directory".to_string()))?;
        Ok(Self::new(dir.join("reminders")))
    }
}

impl MailboxSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let record: IdentityRecord = serde_json::from_str(&content)
            .map_err(|e| AppError::decode(format!("corrupt identity file: {}", e)))?;
        Ok(Some(record.mailbox_id))
    }

    fn store(&self, mailbox_id: &str) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let record = IdentityRecord {
            mailbox_id: mailbox_id.to_string(),
        };
        let content = serde_json::to_string_pretty(&record)
            .map_err(|e| AppError::decode(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MailboxSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        let value = self.value.lock().map_err(|_| AppError::InternalServerError)?;
        Ok(value.clone())
    }

    fn store(&self, mailbox_id: &str) -> Result<(), AppError> {
        let mut value = self.value.lock().map_err(|_| AppError::InternalServerError)?;
        *value = Some(mailbox_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut value = self.value.lock().map_err(|_| AppError::InternalServerError)?;
        *value = None;
        Ok(())
    }
}

/// Which mailbox the client is acting for. The active id is read from the
/// slot once on open and handed to the view explicitly afterwards.
pub struct IdentityBinding {
    slot: Box<dyn MailboxSlot>,
    active: Option<MailboxId>,
}

impl IdentityBinding {
    pub fn open(slot: Box<dyn MailboxSlot>) -> Result<Self, AppError> {
        let active = slot.load()?.as_deref().and_then(MailboxId::parse);
        Ok(Self { slot, active })
    }

    pub fn get(&self) -> Option<&MailboxId> {
        self.active.as_ref()
    }

    /// Blank input leaves everything untouched and yields `Ok(None)`.
    pub fn bind(&mut self, raw: &str) -> Result<Option<MailboxId>, AppError> {
        let Some(id) = MailboxId::parse(raw) else {
            return Ok(None);
        };

        self.slot.store(id.as_str())?;
        info!("bound mailbox {}", id);
        self.active = Some(id.clone());
        Ok(Some(id))
    }

    pub fn unbind(&mut self) -> Result<(), AppError> {
        self.slot.clear()?;
        if let Some(id) = self.active.take() {
            info!("unbound mailbox {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut binding = IdentityBinding::open(Box::new(FileSlot::new(dir.path()))).unwrap();
        assert!(binding.get().is_none());

        let bound = binding.bind(" 424242 ").unwrap().expect("id should bind");
        assert_eq!(bound.as_str(), "424242");

        let reopened = IdentityBinding::open(Box::new(FileSlot::new(dir.path()))).unwrap();
        assert_eq!(reopened.get().map(MailboxId::as_str), Some("424242"));
    }

    #[test]
    fn test_blank_bind_is_noop() {
        let mut binding = IdentityBinding::open(Box::new(MemorySlot::default())).unwrap();
        binding.bind("first").unwrap();

        assert!(binding.bind("   ").unwrap().is_none());
        assert_eq!(binding.get().map(MailboxId::as_str), Some("first"));
    }

    #[test]
    fn test_unbind_clears_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut binding = IdentityBinding::open(Box::new(FileSlot::new(dir.path()))).unwrap();
        binding.bind("424242").unwrap();
        binding.unbind().unwrap();
        assert!(binding.get().is_none());

        // clearing twice is fine
        binding.unbind().unwrap();

        let reopened = IdentityBinding::open(Box::new(FileSlot::new(dir.path()))).unwrap();
        assert!(reopened.get().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(IDENTITY_FILE), "not json").unwrap();

        let result = IdentityBinding::open(Box::new(FileSlot::new(dir.path())));
        assert!(matches!(result, Err(AppError::Decode(_))));
    }
}
