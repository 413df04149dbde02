//! Shared application state

use std::sync::Arc;

use crate::accounts::Accounts;
use crate::catalog::EventCatalog;
use crate::store::Database;
use crate::subscriptions::SubscriptionManager;
use crate::sync::IndexSynchronizer;

/// Services shared by every request handler
pub struct AppState {
    pub catalog: EventCatalog,
    pub subscriptions: SubscriptionManager,
    pub accounts: Accounts,
}

impl AppState {
    pub fn new(db: Arc<Database>, sync: IndexSynchronizer) -> Self {
        Self {
            catalog: EventCatalog::new(Arc::clone(&db), sync.clone()),
            subscriptions: SubscriptionManager::new(Arc::clone(&db)),
            accounts: Accounts::new(db, sync),
        }
    }
}
