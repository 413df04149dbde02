//! Pending search-index operations
//!
//! Outbox entries are written in the same store transaction as the change
//! they mirror, then applied to the search index and acknowledged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EventId;

/// Index operation keyed by event id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOp {
    /// (Re)index the event from its current row
    Upsert,
    /// Remove the event's document
    Delete,
}

impl fmt::Display for IndexOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexOp::Upsert => write!(f, "upsert"),
            IndexOp::Delete => write!(f, "delete"),
        }
    }
}

/// One pending outbox entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub seq: u64,
    #[serde(rename = "eventId")]
    pub event_id: EventId,
    pub op: IndexOp,
    #[serde(rename = "enqueuedAt")]
    pub enqueued_at: DateTime<Utc>,
}
