//! Wire contract shared by the store service and its HTTP client.
//!
//! Field names and the `remind_at` format live on the model types; this module
//! carries the version handshake and the small acknowledgement bodies.

use serde::{Deserialize, Serialize};

pub const CONTRACT_HEADER: &str = "x-reminders-contract";
pub const CONTRACT_VERSION: &str = "1";

pub const REMINDERS_PATH: &str = "/reminders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}
