//! Event catalog: creating, editing and cancelling events
//!
//! Every change that affects search enqueues an index operation in the same
//! transaction, then drains the outbox right away. A failed drain leaves the
//! entry pending for the sweep; it never undoes the committed change.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ForbiddenReason};
use crate::lifecycle;
use crate::store::Database;
use crate::sync::IndexSynchronizer;
use crate::types::{Category, CategoryId, Event, EventDetails, EventDraft, EventId, IndexOp, UserId};
use crate::utils::page;

pub struct EventCatalog {
    db: Arc<Database>,
    sync: IndexSynchronizer,
}

impl EventCatalog {
    pub fn new(db: Arc<Database>, sync: IndexSynchronizer) -> Self {
        Self { db, sync }
    }

    pub async fn create_event(&self, actor: UserId, draft: EventDraft) -> CoreResult<EventId> {
        draft.validate().map_err(CoreError::InvalidInput)?;

        let id = self.db.transaction(|tx| {
            tx.require_user(actor)?;
            tx.require_category(draft.category_id)?;

            let now = Utc::now();
            let mut event = Event::from_draft(Uuid::new_v4(), actor, &draft, now);
            event.status = lifecycle::status_at(now, event.starts_at, event.duration());

            let id = event.id;
            tx.put_event(event);
            tx.enqueue_index(id, IndexOp::Upsert);
            Ok(id)
        })?;

        info!(event_id = %id, organizer = %actor, "Event created");
        self.reindex().await;
        Ok(id)
    }

    pub fn get_event(&self, id: EventId) -> CoreResult<EventDetails> {
        self.db.read(|t| t.event_details(id))
    }

    /// Every event, oldest first
    pub fn list_events(&self) -> Vec<EventDetails> {
        self.db.read(|t| t.event_details_list(&t.event_ids()))
    }

    pub fn events_page(&self, start: usize, end: usize) -> Vec<EventDetails> {
        self.db.read(|t| t.event_details_list(&page(&t.event_ids(), start, end)))
    }

    /// Replace the organizer-editable fields of an event
    ///
    /// Status is left to the archiver, so an edit never moves it backwards.
    pub async fn edit_event(&self, actor: UserId, id: EventId, draft: EventDraft) -> CoreResult<()> {
        draft.validate().map_err(CoreError::InvalidInput)?;

        self.db.transaction(|tx| {
            let current = tx.require_event(id)?.clone();
            if current.organizer_id != actor {
                return Err(CoreError::Forbidden(ForbiddenReason::NotOrganizer));
            }
            tx.require_category(draft.category_id)?;

            let seats = tx.seat_count(id);
            if draft.max_attendees > 0 && (draft.max_attendees as usize) < seats {
                return Err(CoreError::InvalidInput(format!(
                    "maxAttendees {} is below the current {} attendees",
                    draft.max_attendees, seats
                )));
            }

            let mut event = Event::from_draft(id, current.organizer_id, &draft, current.created_at);
            event.status = current.status;
            if draft.cover.is_none() {
                event.cover = current.cover;
            }
            tx.put_event(event);
            tx.enqueue_index(id, IndexOp::Upsert);
            Ok(())
        })?;

        self.reindex().await;
        Ok(())
    }

    pub fn update_cover(&self, actor: UserId, id: EventId, cover: Option<String>) -> CoreResult<()> {
        self.db.transaction(|tx| {
            let mut event = tx.require_event(id)?.clone();
            if event.organizer_id != actor {
                return Err(CoreError::Forbidden(ForbiddenReason::NotOrganizer));
            }
            event.cover = cover;
            tx.put_event(event);
            Ok(())
        })
    }

    /// Delete an event with all its memberships and de-index it
    pub async fn cancel_event(&self, actor: UserId, id: EventId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            if tx.require_event(id)?.organizer_id != actor {
                return Err(CoreError::Forbidden(ForbiddenReason::NotOrganizer));
            }
            tx.delete_event(id);
            tx.enqueue_index(id, IndexOp::Delete);
            Ok(())
        })?;

        info!(event_id = %id, "Event cancelled");
        self.reindex().await;
        Ok(())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.db.read(|t| t.categories().cloned().collect())
    }

    pub fn events_in_category(&self, category: CategoryId) -> CoreResult<Vec<EventDetails>> {
        self.db.read(|t| {
            t.require_category(category)?;
            Ok(t.event_details_list(&t.events_in_category(category)))
        })
    }

    pub fn events_in_category_page(
        &self,
        category: CategoryId,
        start: usize,
        end: usize,
    ) -> CoreResult<Vec<EventDetails>> {
        self.db.read(|t| {
            t.require_category(category)?;
            let ids = page(&t.events_in_category(category), start, end);
            Ok(t.event_details_list(&ids))
        })
    }

    /// Ranked full-text search over committed index documents
    pub fn search(&self, query: &str, limit: usize) -> Vec<EventDetails> {
        let ids = self.sync.search(query, limit);
        self.db.read(|t| t.event_details_list(&ids))
    }

    async fn reindex(&self) {
        if let Err(e) = self.sync.drain().await {
            warn!(error = %e, "Search index out of date until the next sweep");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Missing;
    use crate::search::SearchIndex;
    use crate::types::{EventStatus, GeoPoint, Membership, User};
    use chrono::Duration;

    fn setup() -> (Arc<Database>, EventCatalog, UserId) {
        let db = Arc::new(Database::in_memory());
        let sync = IndexSynchronizer::new(Arc::clone(&db), SearchIndex::in_memory());
        let catalog = EventCatalog::new(Arc::clone(&db), sync);
        let organizer = Uuid::new_v4();
        db.transaction(|tx| {
            tx.put_user(User {
                id: organizer,
                user_name: "ella".to_string(),
                first_name: "Ella".to_string(),
                last_name: "Fitzgerald".to_string(),
                email: "ella@example.com".to_string(),
                biography: None,
                birth_date: None,
                profile_picture: None,
                created_at: Utc::now(),
            });
            Ok(())
        })
        .unwrap();
        (db, catalog, organizer)
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: Some("An evening of standards".to_string()),
            starts_at: Utc::now() + Duration::days(7),
            duration_secs: 7200,
            price: 20.0,
            location: GeoPoint::new(2.35, 48.85),
            category_id: 5,
            max_attendees: 0,
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_cancel_updates_search() {
        let (db, catalog, organizer) = setup();

        let id = catalog.create_event(organizer, draft("Jazz Night")).await.unwrap();
        let found: Vec<EventId> = catalog.search("Jazz", 10).iter().map(|e| e.id).collect();
        assert_eq!(found, vec![id]);

        // Organizer names are searchable too
        assert_eq!(catalog.search("fitzgerald", 10).len(), 1);

        catalog.cancel_event(organizer, id).await.unwrap();
        assert!(catalog.search("Jazz", 10).is_empty());
        assert!(db.read(|t| t.pending_index_ops().is_empty()));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (_db, catalog, organizer) = setup();

        let mut bad = draft("Jazz Night");
        bad.price = -1.0;
        assert!(matches!(
            catalog.create_event(organizer, bad).await.unwrap_err(),
            CoreError::InvalidInput(_)
        ));

        let mut unknown = draft("Jazz Night");
        unknown.category_id = 6;
        assert!(matches!(
            catalog.create_event(organizer, unknown).await.unwrap_err(),
            CoreError::NotFound(Missing::Category(6))
        ));
    }

    #[tokio::test]
    async fn test_initial_status_follows_clock() {
        let (_db, catalog, organizer) = setup();
        let mut past = draft("Yesterday");
        past.starts_at = Utc::now() - Duration::days(1);
        past.duration_secs = 60;

        let id = catalog.create_event(organizer, past).await.unwrap();
        assert_eq!(catalog.get_event(id).unwrap().status, EventStatus::Ended);
    }

    #[tokio::test]
    async fn test_edit_is_organizer_only_and_reindexes() {
        let (db, catalog, organizer) = setup();
        let id = catalog.create_event(organizer, draft("Jazz Night")).await.unwrap();

        let err = catalog
            .edit_event(Uuid::new_v4(), id, draft("Blues Night"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ForbiddenReason::NotOrganizer)));

        let mut moved = draft("Blues Night");
        moved.category_id = 2;
        catalog.edit_event(organizer, id, moved).await.unwrap();

        assert!(catalog.search("jazz", 10).is_empty());
        assert_eq!(catalog.search("blues", 10).len(), 1);
        assert_eq!(catalog.events_in_category(2).unwrap().len(), 1);
        assert!(catalog.events_in_category(5).unwrap().is_empty());
        assert_eq!(db.read(|t| t.event(id).unwrap().title.clone()), "Blues Night");
    }

    #[tokio::test]
    async fn test_oversized_duration_is_rejected_on_create() {
        let (db, catalog, organizer) = setup();
        let mut started = draft("Endless");
        started.starts_at = Utc::now() - Duration::minutes(5);
        started.duration_secs = 9_000_000_000_000;

        assert!(matches!(
            catalog.create_event(organizer, started).await.unwrap_err(),
            CoreError::InvalidInput(_)
        ));
        assert_eq!(db.read(|t| t.event_count()), 0);
    }

    #[tokio::test]
    async fn test_oversized_duration_edit_keeps_archiver_running() {
        let (db, catalog, organizer) = setup();
        let start = Utc::now() + Duration::minutes(10);
        let mut short = draft("Lunch talk");
        short.starts_at = start;
        short.duration_secs = 60;
        let healthy = catalog.create_event(organizer, short).await.unwrap();
        let other = catalog.create_event(organizer, draft("Jazz Night")).await.unwrap();

        let mut endless = draft("Jazz Night");
        endless.duration_secs = 9_000_000_000_000;
        assert!(matches!(
            catalog.edit_event(organizer, other, endless).await.unwrap_err(),
            CoreError::InvalidInput(_)
        ));
        assert_eq!(db.read(|t| t.event(other).unwrap().duration_secs), 7200);

        let report = crate::archiver::Archiver::new(Arc::clone(&db), std::time::Duration::from_secs(60))
            .run_pass(start + Duration::hours(1))
            .unwrap();
        assert!(report.outcomes.iter().any(|o| o.event_id == healthy));
        assert_eq!(catalog.get_event(healthy).unwrap().status, EventStatus::Ended);
    }

    #[tokio::test]
    async fn test_edit_cannot_drop_capacity_below_attendance() {
        let (db, catalog, organizer) = setup();
        let id = catalog.create_event(organizer, draft("Jazz Night")).await.unwrap();
        db.transaction(|tx| {
            tx.link(Membership::attending(organizer, id));
            tx.link(Membership::attending(Uuid::new_v4(), id));
            Ok(())
        })
        .unwrap();

        let mut tight = draft("Jazz Night");
        tight.max_attendees = 1;
        assert!(matches!(
            catalog.edit_event(organizer, id, tight).await.unwrap_err(),
            CoreError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_cancel_cascades_memberships() {
        let (db, catalog, organizer) = setup();
        let id = catalog.create_event(organizer, draft("Jazz Night")).await.unwrap();
        db.transaction(|tx| {
            tx.link(Membership::saved(organizer, id));
            Ok(())
        })
        .unwrap();

        catalog.cancel_event(organizer, id).await.unwrap();

        assert!(matches!(
            catalog.get_event(id).unwrap_err(),
            CoreError::NotFound(Missing::Event(_))
        ));
        assert!(db.read(|t| t.user_events(organizer, crate::types::MembershipKind::Saved).is_empty()));
    }

    #[tokio::test]
    async fn test_listing_and_paging() {
        let (_db, catalog, organizer) = setup();
        for title in ["One", "Two", "Three"] {
            catalog.create_event(organizer, draft(title)).await.unwrap();
        }

        assert_eq!(catalog.list_events().len(), 3);
        let page = catalog.events_page(1, 10);
        assert_eq!(page.len(), 2);
        assert_eq!(catalog.events_in_category_page(5, 0, 1).unwrap().len(), 1);
        assert_eq!(catalog.categories().len(), 8);

        catalog
            .update_cover(organizer, page[0].id, Some("covers/two.png".to_string()))
            .unwrap();
        assert_eq!(
            catalog.get_event(page[0].id).unwrap().cover.as_deref(),
            Some("covers/two.png")
        );
    }
}
