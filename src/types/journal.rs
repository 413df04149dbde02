//! Record types for the store journal
//!
//! A commit is one line in `journal.jsonl` holding every change of one
//! transaction; replaying commits in order rebuilds the tables. Snapshot files
//! start with a [`SnapshotMeta`] line followed by one [`StoredRecord`] per row.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Category, Event, EventId, Follow, Membership, OutboxEntry, User};

/// A single row-level change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", content = "data", rename_all = "snake_case")]
pub enum Change {
    PutEvent(Event),
    /// Removes the event row and every membership edge of the event
    DeleteEvent(EventId),
    PutUser(User),
    PutCategory(Category),
    Link(Membership),
    Unlink(Membership),
    Follow(Follow),
    Unfollow(Follow),
    /// Queue an index operation, replacing any pending one for the same event
    Enqueue(OutboxEntry),
    /// Drop the outbox entry with this sequence number, if still pending
    Ack(u64),
}

/// One committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Unique, auto-incrementing commit ID
    #[serde(rename = "commitId")]
    pub commit_id: u64,

    /// Unix timestamp (milliseconds) of the commit
    #[serde(rename = "ts")]
    pub timestamp: i64,

    pub changes: Vec<Change>,
}

impl CommitRecord {
    /// Create a new commit stamped with the current time
    pub fn new(commit_id: u64, changes: Vec<Change>) -> Self {
        Self {
            commit_id,
            timestamp: Utc::now().timestamp_millis(),
            changes,
        }
    }

    /// Serialize commit to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize commit from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Row stored in a snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum StoredRecord {
    Category(Category),
    User(User),
    Event(Event),
    Membership(Membership),
    Follow(Follow),
    Outbox(OutboxEntry),
    /// Next outbox sequence number, so acknowledged numbers are never reused
    OutboxSeq(u64),
}

/// Snapshot metadata - first line in snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Always "snapshot_meta" to identify this as metadata
    #[serde(rename = "type")]
    pub meta_type: String,

    /// Last commit ID included in this snapshot
    pub last_commit_id: u64,

    /// Unix timestamp when snapshot was created
    pub created_at: i64,

    /// Number of rows following this line
    pub record_count: usize,

    /// Version of snapshot format
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl SnapshotMeta {
    /// Create new snapshot metadata
    pub fn new(last_commit_id: u64, record_count: usize) -> Self {
        Self {
            meta_type: "snapshot_meta".to_string(),
            last_commit_id,
            created_at: Utc::now().timestamp(),
            record_count,
            version: 1,
        }
    }

    /// Parse from JSON string (first line of snapshot file)
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Serialize to JSON string
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MembershipKind;
    use uuid::Uuid;

    #[test]
    fn test_change_serialization_is_tagged() {
        let edge = Membership::new(Uuid::nil(), Uuid::nil(), MembershipKind::Banned);
        let json = serde_json::to_string(&Change::Link(edge)).unwrap();
        assert!(json.contains("\"change\":\"link\""));
        assert!(json.contains("\"kind\":\"banned\""));

        let parsed: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Change::Link(edge));
    }

    #[test]
    fn test_commit_line_round_trip() {
        let commit = CommitRecord::new(7, vec![Change::Ack(3), Change::DeleteEvent(Uuid::nil())]);
        let line = commit.to_json_line().unwrap();
        assert!(line.contains("\"commitId\":7"));

        let parsed = CommitRecord::from_json_line(&line).unwrap();
        assert_eq!(parsed.commit_id, 7);
        assert_eq!(parsed.changes.len(), 2);
    }

    #[test]
    fn test_snapshot_meta_serialization() {
        let meta = SnapshotMeta::new(1000, 42);

        let json = meta.to_json_line().unwrap();
        assert!(json.contains("\"type\":\"snapshot_meta\""));
        assert!(json.contains("\"last_commit_id\":1000"));

        let parsed = SnapshotMeta::from_json_line(&json).unwrap();
        assert_eq!(parsed.last_commit_id, 1000);
        assert_eq!(parsed.record_count, 42);
    }
}
