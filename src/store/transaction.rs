//! Changes applied in place under the store lock
//!
//! A transaction reads its own writes through `Deref<Target = Tables>`.
//! Every change is applied to the committed tables as it is staged, together
//! with an undo record. Dropping a transaction that was not committed
//! (an error, a failed journal append, a panic) reverts all of it before the
//! lock is released, so nothing it staged is ever seen by other callers.

use std::ops::Deref;

use chrono::Utc;

use crate::types::{
    Category, Change, Event, EventId, Follow, IndexOp, Membership, OutboxEntry, User,
};

use super::tables::Undo;
use super::Tables;

pub struct Transaction<'a> {
    tables: &'a mut Tables,
    changes: Vec<Change>,
    undo: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(tables: &'a mut Tables) -> Self {
        Self {
            tables,
            changes: Vec::new(),
            undo: Vec::new(),
        }
    }

    fn stage(&mut self, change: Change) {
        self.undo.push(self.tables.apply_undoable(&change));
        self.changes.push(change);
    }

    /// Number of staged changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn put_event(&mut self, event: Event) {
        self.stage(Change::PutEvent(event));
    }

    /// Remove an event and every membership edge pointing at it
    pub fn delete_event(&mut self, id: EventId) {
        self.stage(Change::DeleteEvent(id));
    }

    pub fn put_user(&mut self, user: User) {
        self.stage(Change::PutUser(user));
    }

    pub fn put_category(&mut self, category: Category) {
        self.stage(Change::PutCategory(category));
    }

    /// Insert an edge; returns false if it already existed
    pub fn link(&mut self, edge: Membership) -> bool {
        if self.tables.has(&edge) {
            return false;
        }
        self.stage(Change::Link(edge));
        true
    }

    /// Remove an edge; returns false if it was absent
    pub fn unlink(&mut self, edge: Membership) -> bool {
        if !self.tables.has(&edge) {
            return false;
        }
        self.stage(Change::Unlink(edge));
        true
    }

    pub fn follow(&mut self, edge: Follow) -> bool {
        if self.tables.is_following(edge.follower, edge.followee) {
            return false;
        }
        self.stage(Change::Follow(edge));
        true
    }

    pub fn unfollow(&mut self, edge: Follow) -> bool {
        if !self.tables.is_following(edge.follower, edge.followee) {
            return false;
        }
        self.stage(Change::Unfollow(edge));
        true
    }

    /// Record a pending index operation for `event_id`
    ///
    /// Replaces any entry still pending for the same event. Returns the
    /// sequence number assigned.
    pub fn enqueue_index(&mut self, event_id: EventId, op: IndexOp) -> u64 {
        let seq = self.tables.next_outbox_seq();
        self.stage(Change::Enqueue(OutboxEntry {
            seq,
            event_id,
            op,
            enqueued_at: Utc::now(),
        }));
        seq
    }

    /// Acknowledge an applied outbox entry
    pub fn ack_index(&mut self, seq: u64) {
        self.stage(Change::Ack(seq));
    }

    /// Changes to journal; the transaction still reverts them if dropped
    pub(crate) fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Keep every applied change
    pub(crate) fn commit(mut self) {
        self.undo.clear();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.undo.is_empty() {
            let undo = std::mem::take(&mut self.undo);
            self.tables.revert(undo);
        }
    }
}

impl Deref for Transaction<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        self.tables
    }
}
