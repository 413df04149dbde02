//! Full-text search over events
//!
//! ```text
//!  IndexWriter (one at a time)          readers
//!   add/remove ─► buffer                  │
//!   flush(false) ─► private working copy  │
//!   flush(true) ──► documents.jsonl ──► committed generation ◄── search()
//! ```
//!
//! Writers are serialized by an async mutex plus a `write.lock` file in the
//! index directory. Readers only ever see committed generations.

mod document;
mod index;
mod writer;

pub use document::{tokenize, IndexDocument};
pub use index::{IndexStats, SearchIndex};
pub use writer::IndexWriter;

use std::path::PathBuf;

use thiserror::Error;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur in index operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("index is locked by another writer: {}", .0.display())]
    LockHeld(PathBuf),
}
