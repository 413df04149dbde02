//! Index synchronizer: applies the outbox to the search index
//!
//! Store changes enqueue index operations in the same transaction that makes
//! them. `drain` applies the pending entries in one writer session, commits
//! the index, then acknowledges the entries. Every operation is idempotent,
//! so an entry applied but not yet acknowledged is simply applied again.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::search::{IndexDocument, SearchIndex};
use crate::store::{Database, Tables};
use crate::types::{EventId, IndexOp, OutboxEntry};

enum Action {
    Add(IndexDocument),
    Remove(EventId),
}

/// Build the index document for an event from the current rows
pub fn document_for(tables: &Tables, id: EventId) -> Option<IndexDocument> {
    tables.event(id).map(|event| {
        IndexDocument::from_event(
            event,
            tables.category(event.category_id),
            tables.user(event.organizer_id),
        )
    })
}

#[derive(Clone)]
pub struct IndexSynchronizer {
    db: Arc<Database>,
    index: SearchIndex,
}

impl IndexSynchronizer {
    pub fn new(db: Arc<Database>, index: SearchIndex) -> Self {
        Self { db, index }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Apply every pending outbox entry; returns how many were acknowledged
    pub async fn drain(&self) -> CoreResult<usize> {
        if self.db.read(|t| t.pending_index_ops().is_empty()) {
            return Ok(0);
        }

        let mut writer = self.index.open_writer().await?;

        // Read after taking the writer so concurrent drains apply in order
        let (pending, actions) = self.db.read(|t| {
            let pending = t.pending_index_ops();
            let actions: Vec<Action> = pending.iter().map(|entry| plan(t, entry)).collect();
            (pending, actions)
        });

        for action in actions {
            match action {
                Action::Add(doc) => writer.add(doc),
                Action::Remove(id) => writer.remove(id),
            }
        }
        writer.flush(true)?;
        writer.close()?;

        let applied = self.acknowledge(&pending)?;
        debug!(applied, "Outbox drained");
        Ok(applied)
    }

    fn acknowledge(&self, entries: &[OutboxEntry]) -> CoreResult<usize> {
        self.db.transaction(|tx| {
            let still_pending: HashSet<u64> =
                tx.pending_index_ops().into_iter().map(|e| e.seq).collect();
            let mut acked = 0;
            for entry in entries {
                // A newer entry for the same event replaces this one and stays pending
                if still_pending.contains(&entry.seq) {
                    tx.ack_index(entry.seq);
                    acked += 1;
                }
            }
            Ok(acked)
        })
    }

    /// Re-index every event from the store
    pub async fn rebuild(&self) -> CoreResult<usize> {
        let mut writer = self.index.open_writer().await?;

        let (pending, docs) = self.db.read(|t| {
            let docs: Vec<IndexDocument> = t
                .event_ids()
                .into_iter()
                .filter_map(|id| document_for(t, id))
                .collect();
            (t.pending_index_ops(), docs)
        });
        let count = docs.len();

        writer.clear();
        for doc in docs {
            writer.add(doc);
        }
        writer.close()?;

        self.acknowledge(&pending)?;
        info!(documents = count, "Search index rebuilt");
        Ok(count)
    }

    /// Whether the committed index is empty while the store has events
    pub fn needs_rebuild(&self) -> bool {
        self.index.is_empty() && self.db.read(|t| t.event_count() > 0)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<EventId> {
        self.index.search(query, limit)
    }

    /// Retry pending entries every `interval` until `shutdown` is cancelled
    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Index sweep started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            match self.drain().await {
                Ok(0) => {}
                Ok(n) => info!(applied = n, "Index sweep applied pending entries"),
                Err(e) => warn!(error = %e, "Index sweep failed, entries stay pending"),
            }
        }

        info!("Index sweep stopped");
    }
}

fn plan(tables: &Tables, entry: &OutboxEntry) -> Action {
    match entry.op {
        IndexOp::Upsert => match document_for(tables, entry.event_id) {
            Some(doc) => Action::Add(doc),
            None => Action::Remove(entry.event_id),
        },
        IndexOp::Delete => Action::Remove(entry.event_id),
    }
}
