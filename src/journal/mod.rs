//! Journal: durability layer of the embedded store
//!
//! - `Journal`: append-only commit log, one line per committed transaction
//! - `SnapshotManager`: point-in-time copies of every table
//! - `LogRotation`: moves commits covered by a snapshot into archives
//!
//! # Architecture
//!
//! ```text
//! Commit Path:
//! ┌─────────────┐    ┌────────────────┐    ┌──────────────────┐    ┌──────────────┐
//! │ Transaction │───►│ append + fsync │───►│ maybe snapshot() │───►│ rotate_log() │
//! │   changes   │    │ journal.jsonl  │    │ every N commits  │    │ archive old  │
//! └─────────────┘    └────────────────┘    └──────────────────┘    └──────────────┘
//!
//! Recovery (Startup):
//! ┌───────────────┐    ┌─────────────────┐
//! │ Load snapshot │───►│ Replay commits  │───► Tables ready
//! │ (latest.jsonl)│    │ after snapshot  │
//! └───────────────┘    └─────────────────┘
//! ```

mod rotation;
mod snapshot;
mod store;

pub use rotation::{ArchiveInfo, LogRotation};
pub use snapshot::SnapshotManager;
pub use store::{Journal, JournalConfig, JournalError, JournalResult, Recovered};
