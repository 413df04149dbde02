//! Accounts: registration, profiles and the follow graph

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ConflictReason, CoreError, CoreResult, ForbiddenReason};
use crate::store::Database;
use crate::sync::IndexSynchronizer;
use crate::types::{Follow, IndexOp, NewUser, ProfileEdit, User, UserDetails, UserId};

pub struct Accounts {
    db: Arc<Database>,
    sync: IndexSynchronizer,
}

impl Accounts {
    pub fn new(db: Arc<Database>, sync: IndexSynchronizer) -> Self {
        Self { db, sync }
    }

    pub fn register(&self, new_user: NewUser) -> CoreResult<UserId> {
        let user_name = new_user.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(CoreError::InvalidInput("user name must not be empty".to_string()));
        }

        let id = self.db.transaction(|tx| {
            if tx.user_by_name(&user_name).is_some() {
                return Err(CoreError::Conflict(ConflictReason::UserNameTaken));
            }

            let id = Uuid::new_v4();
            tx.put_user(User {
                id,
                user_name: user_name.clone(),
                first_name: new_user.first_name.clone(),
                last_name: new_user.last_name.clone(),
                email: new_user.email.clone(),
                biography: new_user.biography.clone(),
                birth_date: new_user.birth_date,
                profile_picture: None,
                created_at: Utc::now(),
            });
            Ok(id)
        })?;

        info!(user_id = %id, user_name = %user_name, "User registered");
        Ok(id)
    }

    pub fn user_details(&self, id: UserId) -> CoreResult<UserDetails> {
        self.db.read(|t| t.user_details(id))
    }

    /// Apply a profile edit
    ///
    /// A name change re-indexes the user's organized events, whose documents
    /// carry the organizer's names.
    pub async fn edit_profile(&self, actor: UserId, edit: ProfileEdit) -> CoreResult<UserDetails> {
        let renamed = self.db.transaction(|tx| {
            let mut user = tx.require_user(actor)?.clone();
            let renamed = edit.first_name.is_some() || edit.last_name.is_some();

            if let Some(first_name) = &edit.first_name {
                user.first_name = first_name.clone();
            }
            if let Some(last_name) = &edit.last_name {
                user.last_name = last_name.clone();
            }
            if let Some(biography) = &edit.biography {
                user.biography = Some(biography.clone());
            }
            if let Some(birth_date) = edit.birth_date {
                user.birth_date = Some(birth_date);
            }
            if let Some(picture) = &edit.profile_picture {
                user.profile_picture = Some(picture.clone());
            }
            tx.put_user(user);

            if renamed {
                for event_id in tx.organized_events(actor) {
                    tx.enqueue_index(event_id, IndexOp::Upsert);
                }
            }
            Ok(renamed)
        })?;

        if renamed {
            if let Err(e) = self.sync.drain().await {
                warn!(error = %e, "Search index out of date until the next sweep");
            }
        }
        self.user_details(actor)
    }

    pub fn follow(&self, actor: UserId, target: UserId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            tx.require_user(actor)?;
            tx.require_user(target)?;
            if actor == target {
                return Err(CoreError::Forbidden(ForbiddenReason::SelfFollow));
            }
            if !tx.follow(Follow::new(actor, target)) {
                return Err(CoreError::Conflict(ConflictReason::AlreadyFollowing));
            }
            Ok(())
        })
    }

    pub fn unfollow(&self, actor: UserId, target: UserId) -> CoreResult<()> {
        self.db.transaction(|tx| {
            tx.require_user(actor)?;
            tx.require_user(target)?;
            if !tx.unfollow(Follow::new(actor, target)) {
                return Err(CoreError::Conflict(ConflictReason::NotFollowing));
            }
            Ok(())
        })
    }

    pub fn followers(&self, id: UserId) -> CoreResult<Vec<UserDetails>> {
        self.db.read(|t| {
            t.require_user(id)?;
            Ok(t.user_details_list(&t.followers(id)))
        })
    }

    pub fn following(&self, id: UserId) -> CoreResult<Vec<UserDetails>> {
        self.db.read(|t| {
            t.require_user(id)?;
            Ok(t.user_details_list(&t.following(id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchIndex;
    use crate::types::{Event, EventStatus, GeoPoint};

    fn accounts() -> (Arc<Database>, Accounts) {
        let db = Arc::new(Database::in_memory());
        let sync = IndexSynchronizer::new(Arc::clone(&db), SearchIndex::in_memory());
        (Arc::clone(&db), Accounts::new(db, sync))
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (_db, accounts) = accounts();
        accounts.register(NewUser::new("nina", "Nina", "Simone")).unwrap();

        let err = accounts.register(NewUser::new("NINA", "Other", "Person")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(ConflictReason::UserNameTaken)));

        let err = accounts.register(NewUser::new("  ", "No", "Name")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_follow_views_agree() {
        let (_db, accounts) = accounts();
        let a = accounts.register(NewUser::new("a", "A", "A")).unwrap();
        let b = accounts.register(NewUser::new("b", "B", "B")).unwrap();

        accounts.follow(a, b).unwrap();
        assert_eq!(accounts.following(a).unwrap()[0].id, b);
        assert_eq!(accounts.followers(b).unwrap()[0].id, a);
        assert_eq!(accounts.user_details(b).unwrap().followers, 1);

        assert!(matches!(
            accounts.follow(a, b).unwrap_err(),
            CoreError::Conflict(ConflictReason::AlreadyFollowing)
        ));
        assert!(matches!(
            accounts.follow(a, a).unwrap_err(),
            CoreError::Forbidden(ForbiddenReason::SelfFollow)
        ));

        accounts.unfollow(a, b).unwrap();
        assert!(accounts.followers(b).unwrap().is_empty());
        assert!(matches!(
            accounts.unfollow(a, b).unwrap_err(),
            CoreError::Conflict(ConflictReason::NotFollowing)
        ));
    }

    #[tokio::test]
    async fn test_rename_reindexes_organized_events() {
        let (db, accounts) = accounts();
        let organizer = accounts.register(NewUser::new("bird", "Charlie", "Parker")).unwrap();
        let event = Uuid::new_v4();
        db.transaction(|tx| {
            tx.put_event(Event {
                id: event,
                title: "Bebop".to_string(),
                description: None,
                starts_at: Utc::now(),
                duration_secs: 60,
                price: 0.0,
                location: GeoPoint::default(),
                cover: None,
                category_id: 5,
                organizer_id: organizer,
                max_attendees: 0,
                status: EventStatus::Scheduled,
                created_at: Utc::now(),
            });
            tx.enqueue_index(event, IndexOp::Upsert);
            Ok(())
        })
        .unwrap();

        let edit = ProfileEdit {
            last_name: Some("Yardbird".to_string()),
            ..Default::default()
        };
        let details = accounts.edit_profile(organizer, edit).await.unwrap();

        assert_eq!(details.last_name, "Yardbird");
        assert_eq!(accounts.sync.search("yardbird", 10), vec![event]);
        assert!(accounts.sync.search("parker", 10).is_empty());
    }
}
