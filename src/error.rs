//! Error taxonomy shared by every service
//!
//! Expected outcomes (`NotFound`, `Conflict`, `Forbidden`, `InvalidInput`) are
//! returned to callers as-is. `InternalConsistency` marks a broken data
//! invariant. Journal and index failures wrap the infrastructure errors.

use std::fmt;

use thiserror::Error;

use crate::journal::JournalError;
use crate::search::IndexError;
use crate::types::{CategoryId, EventId, UserId};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// The referenced row that was absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Event(EventId),
    User(UserId),
    Category(CategoryId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Event(id) => write!(f, "event {}", id),
            Missing::User(id) => write!(f, "user {}", id),
            Missing::Category(id) => write!(f, "category {}", id),
        }
    }
}

/// Why a request collides with current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("user already subscribed to event")]
    AlreadyAttending,
    #[error("user not subscribed to event")]
    NotAttending,
    #[error("event reached its maximum number of attendees")]
    CapacityReached,
    #[error("user already banned from event")]
    AlreadyBanned,
    #[error("user is not banned from event")]
    NotBanned,
    #[error("event already saved by user")]
    AlreadySaved,
    #[error("event not saved by user")]
    NotSaved,
    #[error("user already followed")]
    AlreadyFollowing,
    #[error("user not followed")]
    NotFollowing,
    #[error("user name already taken")]
    UserNameTaken,
}

/// Why the acting user may not perform a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ForbiddenReason {
    #[error("you do not own this event")]
    NotOrganizer,
    #[error("user is banned from attending this event")]
    Banned,
    #[error("organizer cannot be banned from own event")]
    SelfBan,
    #[error("users cannot follow themselves")]
    SelfFollow,
}

/// Errors returned by the core services
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(Missing),

    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("search index error: {0}")]
    Index(#[from] IndexError),
}

impl CoreError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::InvalidInput(_) => "BAD_REQUEST",
            CoreError::InternalConsistency(_) => "INTERNAL_CONSISTENCY",
            CoreError::Journal(_) | CoreError::Index(_) => "INTERNAL_ERROR",
        }
    }
}
