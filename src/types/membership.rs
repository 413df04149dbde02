//! Relation edges between users and events, and between users
//!
//! Each relation is stored once as an edge; both directions of a relation are
//! derived views over the same edge set, so they cannot drift apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EventId, UserId};

/// Kind of user-event relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// Live attendance: in the user's attended-events list
    Attending,
    /// Archived attendance: in the user's events history
    Attended,
    /// Bookmark, independent of attendance
    Saved,
    /// Ban-list entry
    Banned,
}

impl MembershipKind {
    /// Kinds that make a user appear in an event's attendee list
    pub fn counts_as_attendee(self) -> bool {
        matches!(self, MembershipKind::Attending | MembershipKind::Attended)
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::Attending => write!(f, "attending"),
            MembershipKind::Attended => write!(f, "attended"),
            MembershipKind::Saved => write!(f, "saved"),
            MembershipKind::Banned => write!(f, "banned"),
        }
    }
}

/// User-event edge, ordered by event first so an event's edges are contiguous
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "eventId")]
    pub event_id: EventId,
    pub kind: MembershipKind,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

impl Membership {
    pub fn new(user_id: UserId, event_id: EventId, kind: MembershipKind) -> Self {
        Self {
            event_id,
            kind,
            user_id,
        }
    }

    pub fn attending(user_id: UserId, event_id: EventId) -> Self {
        Self::new(user_id, event_id, MembershipKind::Attending)
    }

    pub fn attended(user_id: UserId, event_id: EventId) -> Self {
        Self::new(user_id, event_id, MembershipKind::Attended)
    }

    pub fn saved(user_id: UserId, event_id: EventId) -> Self {
        Self::new(user_id, event_id, MembershipKind::Saved)
    }

    pub fn banned(user_id: UserId, event_id: EventId) -> Self {
        Self::new(user_id, event_id, MembershipKind::Banned)
    }
}

/// Directed follow edge: `follower` follows `followee`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Follow {
    pub follower: UserId,
    pub followee: UserId,
}

impl Follow {
    pub fn new(follower: UserId, followee: UserId) -> Self {
        Self { follower, followee }
    }
}
