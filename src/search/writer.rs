//! Writer sessions
//!
//! A writer owns the process-wide gate and the directory lock for its whole
//! lifetime. Both are released when the writer is dropped, whether or not it
//! was closed.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::types::EventId;

use super::document::IndexDocument;
use super::index::{Generation, Shared};
use super::IndexResult;

#[derive(Debug)]
enum Pending {
    Add(IndexDocument),
    Remove(EventId),
    Clear,
}

#[derive(Debug)]
pub struct IndexWriter {
    shared: Arc<Shared>,
    _gate: OwnedMutexGuard<()>,
    lock: Option<PathBuf>,
    working: Generation,
    buffered: Vec<Pending>,
    /// Working copy differs from the committed generation
    dirty: bool,
}

impl IndexWriter {
    pub(super) fn new(
        shared: Arc<Shared>,
        gate: OwnedMutexGuard<()>,
        lock: Option<PathBuf>,
        working: Generation,
    ) -> Self {
        Self {
            shared,
            _gate: gate,
            lock,
            working,
            buffered: Vec::new(),
            dirty: false,
        }
    }

    /// Add or replace the document with `doc.id`
    pub fn add(&mut self, doc: IndexDocument) {
        self.buffered.push(Pending::Add(doc));
    }

    /// Remove the document with `id`; removing an absent id is a no-op
    pub fn remove(&mut self, id: EventId) {
        self.buffered.push(Pending::Remove(id));
    }

    /// Remove every document, including ones added earlier in this session
    pub fn clear(&mut self) {
        self.buffered.push(Pending::Clear);
    }

    /// Apply buffered operations; with `full`, also commit them
    pub fn flush(&mut self, full: bool) -> IndexResult<()> {
        for op in self.buffered.drain(..) {
            match op {
                Pending::Add(doc) => self.working.add(doc),
                Pending::Remove(id) => self.working.remove(id),
                Pending::Clear => self.working = Generation::default(),
            }
            self.dirty = true;
        }

        if full && self.dirty {
            self.commit()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> IndexResult<()> {
        if let Some(path) = self.shared.documents_path() {
            self.working.persist(&path)?;
        }
        *self.shared.committed.write() = Arc::new(self.working.clone());
        self.dirty = false;
        debug!("Index generation committed");
        Ok(())
    }

    /// Commit anything outstanding and end the session
    pub fn close(mut self) -> IndexResult<()> {
        self.flush(true)
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if self.dirty || !self.buffered.is_empty() {
            debug!(pending = self.buffered.len(), "Index writer dropped with uncommitted changes");
        }
        if let Some(lock) = self.lock.take() {
            if let Err(e) = std::fs::remove_file(&lock) {
                warn!(path = %lock.display(), error = %e, "Failed to release index write lock");
            }
        }
    }
}
