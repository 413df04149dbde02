//! Data types for the event platform
//!
//! This module contains all the core data structures used throughout the application.

mod category;
mod event;
mod journal;
mod membership;
mod outbox;
mod user;

pub use category::{default_categories, Category, CategoryId};
pub use event::{Event, EventDetails, EventDraft, EventId, EventStatus, GeoPoint, MAX_DURATION_SECS};
pub use journal::{Change, CommitRecord, SnapshotMeta, StoredRecord};
pub use membership::{Follow, Membership, MembershipKind};
pub use outbox::{IndexOp, OutboxEntry};
pub use user::{NewUser, ProfileEdit, User, UserDetails, UserId};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &u32) -> bool {
    *val == 0
}
