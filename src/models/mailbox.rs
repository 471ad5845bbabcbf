use std::fmt;

use serde::{Deserialize, Serialize};

/// Token scoping every store call to one recipient. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MailboxId(String);

impl MailboxId {
    /// Trims `raw`; `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MailboxId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MailboxId::parse(&value).ok_or_else(|| "mailbox id must not be blank".to_string())
    }
}

impl From<MailboxId> for String {
    fn from(value: MailboxId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(MailboxId::parse("  123456 ").unwrap().as_str(), "123456");
        assert!(MailboxId::parse("").is_none());
        assert!(MailboxId::parse("   ").is_none());
    }
}
