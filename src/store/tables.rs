//! In-memory tables and their derived views
//!
//! `Tables` is the materialized state of the store. It changes only through
//! [`Tables::apply`], which is shared by live transactions and by journal
//! replay, so both paths produce identical state. Transactions apply in place
//! and keep an [`Undo`] per change to revert with.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use uuid::Uuid;

use crate::error::{CoreError, CoreResult, Missing};
use crate::types::{
    default_categories, Category, CategoryId, Change, Event, EventDetails, EventId, Follow,
    Membership, MembershipKind, OutboxEntry, StoredRecord, User, UserDetails, UserId,
};

/// Prior state overwritten by one applied change
#[derive(Debug)]
pub(crate) enum Undo {
    Event(EventId, Option<Event>),
    DeletedEvent(Option<Event>, Vec<Membership>),
    User(UserId, Option<User>),
    Category(CategoryId, Option<Category>),
    Membership(Membership, bool),
    Follow(Follow, bool),
    Outbox {
        inserted: Option<u64>,
        removed: Vec<OutboxEntry>,
        next_seq: u64,
    },
}

/// Every table of the store
#[derive(Debug, Clone)]
pub struct Tables {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    memberships: BTreeSet<Membership>,
    follows: BTreeSet<Follow>,
    outbox: BTreeMap<u64, OutboxEntry>,
    next_outbox_seq: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            events: HashMap::new(),
            users: HashMap::new(),
            categories: BTreeMap::new(),
            memberships: BTreeSet::new(),
            follows: BTreeSet::new(),
            outbox: BTreeMap::new(),
            next_outbox_seq: 1,
        }
    }
}

impl Tables {
    /// Empty tables holding only the default categories
    pub fn seeded() -> Self {
        let mut tables = Self::default();
        for category in default_categories() {
            tables.apply(&Change::PutCategory(category));
        }
        tables
    }

    /// Apply one change
    pub fn apply(&mut self, change: &Change) {
        match change {
            Change::PutEvent(event) => {
                self.events.insert(event.id, event.clone());
            }
            Change::DeleteEvent(id) => {
                self.events.remove(id);
                self.memberships.retain(|m| m.event_id != *id);
            }
            Change::PutUser(user) => {
                self.users.insert(user.id, user.clone());
            }
            Change::PutCategory(category) => {
                self.categories.insert(category.id, category.clone());
            }
            Change::Link(edge) => {
                self.memberships.insert(*edge);
            }
            Change::Unlink(edge) => {
                self.memberships.remove(edge);
            }
            Change::Follow(edge) => {
                self.follows.insert(*edge);
            }
            Change::Unfollow(edge) => {
                self.follows.remove(edge);
            }
            Change::Enqueue(entry) => {
                self.outbox.retain(|_, pending| pending.event_id != entry.event_id);
                self.outbox.insert(entry.seq, entry.clone());
                self.next_outbox_seq = self.next_outbox_seq.max(entry.seq + 1);
            }
            Change::Ack(seq) => {
                self.outbox.remove(seq);
            }
        }
    }

    /// Apply one change, returning what it overwrote
    pub(crate) fn apply_undoable(&mut self, change: &Change) -> Undo {
        let undo = match change {
            Change::PutEvent(event) => Undo::Event(event.id, self.events.get(&event.id).cloned()),
            Change::DeleteEvent(id) => Undo::DeletedEvent(
                self.events.get(id).cloned(),
                self.memberships
                    .iter()
                    .filter(|m| m.event_id == *id)
                    .copied()
                    .collect(),
            ),
            Change::PutUser(user) => Undo::User(user.id, self.users.get(&user.id).cloned()),
            Change::PutCategory(category) => {
                Undo::Category(category.id, self.categories.get(&category.id).cloned())
            }
            Change::Link(edge) | Change::Unlink(edge) => {
                Undo::Membership(*edge, self.memberships.contains(edge))
            }
            Change::Follow(edge) | Change::Unfollow(edge) => {
                Undo::Follow(*edge, self.follows.contains(edge))
            }
            Change::Enqueue(entry) => Undo::Outbox {
                inserted: Some(entry.seq),
                removed: self
                    .outbox
                    .values()
                    .filter(|p| p.event_id == entry.event_id || p.seq == entry.seq)
                    .cloned()
                    .collect(),
                next_seq: self.next_outbox_seq,
            },
            Change::Ack(seq) => Undo::Outbox {
                inserted: None,
                removed: self.outbox.get(seq).cloned().into_iter().collect(),
                next_seq: self.next_outbox_seq,
            },
        };
        self.apply(change);
        undo
    }

    /// Revert changes applied through [`Tables::apply_undoable`], newest first
    pub(crate) fn revert(&mut self, log: Vec<Undo>) {
        for undo in log.into_iter().rev() {
            match undo {
                Undo::Event(id, previous) => restore(&mut self.events, id, previous),
                Undo::DeletedEvent(previous, edges) => {
                    if let Some(event) = previous {
                        self.events.insert(event.id, event);
                    }
                    self.memberships.extend(edges);
                }
                Undo::User(id, previous) => restore(&mut self.users, id, previous),
                Undo::Category(id, previous) => match previous {
                    Some(category) => {
                        self.categories.insert(id, category);
                    }
                    None => {
                        self.categories.remove(&id);
                    }
                },
                Undo::Membership(edge, true) => {
                    self.memberships.insert(edge);
                }
                Undo::Membership(edge, false) => {
                    self.memberships.remove(&edge);
                }
                Undo::Follow(edge, true) => {
                    self.follows.insert(edge);
                }
                Undo::Follow(edge, false) => {
                    self.follows.remove(&edge);
                }
                Undo::Outbox {
                    inserted,
                    removed,
                    next_seq,
                } => {
                    if let Some(seq) = inserted {
                        self.outbox.remove(&seq);
                    }
                    for entry in removed {
                        self.outbox.insert(entry.seq, entry);
                    }
                    self.next_outbox_seq = next_seq;
                }
            }
        }
    }

    /// Rebuild tables from snapshot rows
    pub fn from_records(records: Vec<StoredRecord>) -> Self {
        let mut tables = Self::default();
        for record in records {
            match record {
                StoredRecord::Category(c) => {
                    tables.categories.insert(c.id, c);
                }
                StoredRecord::User(u) => {
                    tables.users.insert(u.id, u);
                }
                StoredRecord::Event(e) => {
                    tables.events.insert(e.id, e);
                }
                StoredRecord::Membership(m) => {
                    tables.memberships.insert(m);
                }
                StoredRecord::Follow(f) => {
                    tables.follows.insert(f);
                }
                StoredRecord::Outbox(entry) => {
                    tables.next_outbox_seq = tables.next_outbox_seq.max(entry.seq + 1);
                    tables.outbox.insert(entry.seq, entry);
                }
                StoredRecord::OutboxSeq(seq) => {
                    tables.next_outbox_seq = tables.next_outbox_seq.max(seq);
                }
            }
        }
        tables
    }

    /// Every row, for snapshotting
    pub fn records(&self) -> Vec<StoredRecord> {
        let mut records = Vec::with_capacity(
            self.categories.len()
                + self.users.len()
                + self.events.len()
                + self.memberships.len()
                + self.follows.len()
                + self.outbox.len()
                + 1,
        );
        records.extend(self.categories.values().cloned().map(StoredRecord::Category));
        records.extend(self.users.values().cloned().map(StoredRecord::User));
        records.extend(self.events.values().cloned().map(StoredRecord::Event));
        records.extend(self.memberships.iter().copied().map(StoredRecord::Membership));
        records.extend(self.follows.iter().copied().map(StoredRecord::Follow));
        records.extend(self.outbox.values().cloned().map(StoredRecord::Outbox));
        records.push(StoredRecord::OutboxSeq(self.next_outbox_seq));
        records
    }

    pub(crate) fn next_outbox_seq(&self) -> u64 {
        self.next_outbox_seq
    }

    // ---- events ----

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn require_event(&self, id: EventId) -> CoreResult<&Event> {
        self.event(id).ok_or(CoreError::NotFound(Missing::Event(id)))
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Event ids ordered by creation time, then id
    pub fn event_ids(&self) -> Vec<EventId> {
        sorted_by_creation(self.events.values())
    }

    pub fn organized_events(&self, user: UserId) -> Vec<EventId> {
        sorted_by_creation(self.events.values().filter(|e| e.organizer_id == user))
    }

    pub fn events_in_category(&self, category: CategoryId) -> Vec<EventId> {
        sorted_by_creation(self.events.values().filter(|e| e.category_id == category))
    }

    // ---- users ----

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn require_user(&self, id: UserId) -> CoreResult<&User> {
        self.user(id).ok_or(CoreError::NotFound(Missing::User(id)))
    }

    pub fn user_by_name(&self, user_name: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.user_name.eq_ignore_ascii_case(user_name))
    }

    // ---- categories ----

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn require_category(&self, id: CategoryId) -> CoreResult<&Category> {
        self.category(id).ok_or(CoreError::NotFound(Missing::Category(id)))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    // ---- memberships ----

    pub fn has(&self, edge: &Membership) -> bool {
        self.memberships.contains(edge)
    }

    /// Users holding a `kind` edge to `event`, in id order
    pub fn members(&self, event: EventId, kind: MembershipKind) -> Vec<UserId> {
        let start = Membership::new(Uuid::nil(), event, kind);
        self.memberships
            .range(start..)
            .take_while(|m| m.event_id == event && m.kind == kind)
            .map(|m| m.user_id)
            .collect()
    }

    /// Event-side attendee list: live attendance plus archived attendance of
    /// users not banned since
    pub fn attendees(&self, event: EventId) -> Vec<UserId> {
        let banned = self.ban_list(event);
        let mut users: Vec<UserId> = self
            .members(event, MembershipKind::Attending)
            .into_iter()
            .chain(
                self.members(event, MembershipKind::Attended)
                    .into_iter()
                    .filter(|u| banned.binary_search(u).is_err()),
            )
            .collect();
        users.sort();
        users.dedup();
        users
    }

    pub fn attendee_count(&self, event: EventId) -> usize {
        self.attendees(event).len()
    }

    /// Seats held against `max_attendees`: live and archived attendance,
    /// banned or not, so lifting a ban never overfills an event
    pub fn seat_count(&self, event: EventId) -> usize {
        let mut users = self.members(event, MembershipKind::Attending);
        users.extend(self.members(event, MembershipKind::Attended));
        users.sort();
        users.dedup();
        users.len()
    }

    pub fn is_attending(&self, user: UserId, event: EventId) -> bool {
        self.has(&Membership::attending(user, event))
    }

    pub fn is_banned(&self, user: UserId, event: EventId) -> bool {
        self.has(&Membership::banned(user, event))
    }

    pub fn ban_list(&self, event: EventId) -> Vec<UserId> {
        self.members(event, MembershipKind::Banned)
    }

    /// User-side view: events the user holds a `kind` edge to
    pub fn user_events(&self, user: UserId, kind: MembershipKind) -> Vec<EventId> {
        sorted_by_creation(
            self.memberships
                .iter()
                .filter(|m| m.user_id == user && m.kind == kind)
                .filter_map(|m| self.events.get(&m.event_id)),
        )
    }

    // ---- follows ----

    pub fn is_following(&self, follower: UserId, followee: UserId) -> bool {
        self.follows.contains(&Follow::new(follower, followee))
    }

    pub fn followers(&self, user: UserId) -> Vec<UserId> {
        self.follows
            .iter()
            .filter(|f| f.followee == user)
            .map(|f| f.follower)
            .collect()
    }

    pub fn following(&self, user: UserId) -> Vec<UserId> {
        let start = Follow::new(user, Uuid::nil());
        self.follows
            .range(start..)
            .take_while(|f| f.follower == user)
            .map(|f| f.followee)
            .collect()
    }

    // ---- projections ----

    pub fn event_details(&self, id: EventId) -> CoreResult<EventDetails> {
        let event = self.require_event(id)?;
        Ok(EventDetails {
            id: event.id,
            title: event.title.clone(),
            starts_at: event.starts_at,
            duration_secs: event.duration_secs,
            description: event.description.clone(),
            price: event.price,
            cover: event.cover.clone(),
            location: event.location,
            organizer_id: event.organizer_id,
            subscribers: self.attendee_count(id),
            max_attendees: event.max_attendees,
            category_id: event.category_id,
            category_name: self
                .category(event.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            status: event.status,
            created_at: event.created_at,
        })
    }

    /// Details for each id, skipping ids without a row
    pub fn event_details_list(&self, ids: &[EventId]) -> Vec<EventDetails> {
        ids.iter().filter_map(|id| self.event_details(*id).ok()).collect()
    }

    pub fn user_details(&self, id: UserId) -> CoreResult<UserDetails> {
        let user = self.require_user(id)?;
        Ok(UserDetails {
            id: user.id,
            user_name: user.user_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            biography: user.biography.clone(),
            profile_picture: user.profile_picture.clone(),
            followers: self.followers(id).len(),
            following: self.following(id).len(),
        })
    }

    pub fn user_details_list(&self, ids: &[UserId]) -> Vec<UserDetails> {
        ids.iter().filter_map(|id| self.user_details(*id).ok()).collect()
    }

    // ---- outbox ----

    /// Pending index operations in enqueue order
    pub fn pending_index_ops(&self) -> Vec<OutboxEntry> {
        self.outbox.values().cloned().collect()
    }
}

fn restore<K: std::hash::Hash + Eq, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

fn sorted_by_creation<'a>(events: impl Iterator<Item = &'a Event>) -> Vec<EventId> {
    let mut keyed: Vec<_> = events.map(|e| (e.created_at, e.id)).collect();
    keyed.sort();
    keyed.into_iter().map(|(_, id)| id).collect()
}
