//! Subscription manager
//!
//! Attendance, bans and saves. Each operation is one store transaction, and
//! the store runs transactions one at a time, so the capacity check and the
//! insert that depends on it cannot interleave with another subscribe.

use std::sync::Arc;

use tracing::info;

use crate::error::{ConflictReason, CoreError, CoreResult, ForbiddenReason};
use crate::store::{Database, Tables};
use crate::types::{Event, EventDetails, EventId, Membership, MembershipKind, UserDetails, UserId};
use crate::utils::page;

pub struct SubscriptionManager {
    db: Arc<Database>,
}

/// Require that `actor` organizes `event`
fn ensure_organizer(event: &Event, actor: UserId) -> CoreResult<()> {
    if event.organizer_id != actor {
        return Err(CoreError::Forbidden(ForbiddenReason::NotOrganizer));
    }
    Ok(())
}

impl SubscriptionManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add `actor` to the event's attendees
    pub fn subscribe(&self, actor: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            let max = tx.require_event(event_id)?.max_attendees;
            tx.require_user(actor)?;

            if tx.is_banned(actor, event_id) {
                return Err(CoreError::Forbidden(ForbiddenReason::Banned));
            }
            // Archived attendance counts as attending
            let attendees = tx.attendees(event_id);
            if attendees.contains(&actor) {
                return Err(CoreError::Conflict(ConflictReason::AlreadyAttending));
            }
            if max > 0 && tx.seat_count(event_id) >= max as usize {
                return Err(CoreError::Conflict(ConflictReason::CapacityReached));
            }

            tx.link(Membership::attending(actor, event_id));
            Ok(())
        })
    }

    pub fn unsubscribe(&self, actor: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            tx.require_event(event_id)?;
            tx.require_user(actor)?;

            if !tx.unlink(Membership::attending(actor, event_id)) {
                return Err(CoreError::Conflict(ConflictReason::NotAttending));
            }
            Ok(())
        })
    }

    /// Organizer removes `subject` from the event's attendees
    pub fn kick(&self, actor: UserId, subject: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            ensure_organizer(tx.require_event(event_id)?, actor)?;
            tx.require_user(subject)?;

            if !tx.unlink(Membership::attending(subject, event_id)) {
                return Err(CoreError::Conflict(ConflictReason::NotAttending));
            }
            info!(event_id = %event_id, user_id = %subject, "Attendee kicked");
            Ok(())
        })
    }

    /// Organizer bans `subject`, dropping live attendance in the same commit
    ///
    /// Archived attendance stays in the subject's history; the ban hides it
    /// from the event's attendee view.
    pub fn ban(&self, actor: UserId, subject: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            let event = tx.require_event(event_id)?;
            ensure_organizer(event, actor)?;
            let organizer = event.organizer_id;
            tx.require_user(subject)?;

            if subject == organizer {
                return Err(CoreError::Forbidden(ForbiddenReason::SelfBan));
            }
            if tx.is_banned(subject, event_id) {
                return Err(CoreError::Conflict(ConflictReason::AlreadyBanned));
            }

            let live = tx.unlink(Membership::attending(subject, event_id));
            tx.link(Membership::banned(subject, event_id));

            info!(
                event_id = %event_id,
                user_id = %subject,
                removed_attendance = live,
                "User banned"
            );
            Ok(())
        })
    }

    /// Organizer lifts a ban; attendance is not restored
    pub fn unban(&self, actor: UserId, subject: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            ensure_organizer(tx.require_event(event_id)?, actor)?;
            tx.require_user(subject)?;

            if !tx.unlink(Membership::banned(subject, event_id)) {
                return Err(CoreError::Conflict(ConflictReason::NotBanned));
            }
            Ok(())
        })
    }

    pub fn save(&self, actor: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            tx.require_event(event_id)?;
            tx.require_user(actor)?;

            if !tx.link(Membership::saved(actor, event_id)) {
                return Err(CoreError::Conflict(ConflictReason::AlreadySaved));
            }
            Ok(())
        })
    }

    pub fn unsave(&self, actor: UserId, event_id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            tx.require_event(event_id)?;
            tx.require_user(actor)?;

            if !tx.unlink(Membership::saved(actor, event_id)) {
                return Err(CoreError::Conflict(ConflictReason::NotSaved));
            }
            Ok(())
        })
    }

    // ---- views ----

    /// The event's attendees, live and archived, minus banned users
    pub fn subscribers(&self, event_id: EventId) -> CoreResult<Vec<UserDetails>> {
        self.db.read(|t| {
            t.require_event(event_id)?;
            Ok(t.user_details_list(&t.attendees(event_id)))
        })
    }

    pub fn subscribers_page(
        &self,
        event_id: EventId,
        start: usize,
        end: usize,
    ) -> CoreResult<Vec<UserDetails>> {
        self.db.read(|t| {
            t.require_event(event_id)?;
            let ids = page(&t.attendees(event_id), start, end);
            Ok(t.user_details_list(&ids))
        })
    }

    /// The event's ban list; only its organizer may read it
    pub fn ban_list(&self, actor: UserId, event_id: EventId) -> CoreResult<Vec<UserDetails>> {
        self.db.read(|t| {
            ensure_organizer(t.require_event(event_id)?, actor)?;
            Ok(t.user_details_list(&t.ban_list(event_id)))
        })
    }

    pub fn organized_events(&self, user: UserId) -> CoreResult<Vec<EventDetails>> {
        self.db.read(|t| {
            t.require_user(user)?;
            Ok(t.event_details_list(&t.organized_events(user)))
        })
    }

    /// Events the user currently attends
    pub fn attended_events(&self, user: UserId) -> CoreResult<Vec<EventDetails>> {
        self.user_events(user, MembershipKind::Attending)
    }

    pub fn saved_events(&self, user: UserId) -> CoreResult<Vec<EventDetails>> {
        self.user_events(user, MembershipKind::Saved)
    }

    /// Ended events the user attended
    pub fn events_history(&self, user: UserId) -> CoreResult<Vec<EventDetails>> {
        self.user_events(user, MembershipKind::Attended)
    }

    fn user_events(&self, user: UserId, kind: MembershipKind) -> CoreResult<Vec<EventDetails>> {
        self.db.read(|t: &Tables| {
            t.require_user(user)?;
            Ok(t.event_details_list(&t.user_events(user, kind)))
        })
    }
}
