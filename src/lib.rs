//! Eventi: event platform core
//!
//! Users create and browse events, subscribe to them, follow each other and
//! search events by text. The core keeps three things correct:
//!
//! - **Lifecycle**: events move Scheduled → Current → Ended with the clock,
//!   driven by a background archiver that also moves attendance to history
//! - **Subscriptions**: capacity, ban and duplicate rules hold under
//!   concurrent requests
//! - **Search consistency**: the search index follows the store through a
//!   transactional outbox, drained after each change and by a periodic sweep
//!
//! # Modules
//!
//! - `types`: Core data structures (Event, User, Category, edges, journal records)
//! - `journal`: Append-only commit log with snapshots and rotation
//! - `store`: Transactional in-memory tables persisted through the journal
//! - `lifecycle`: Pure status function and forward transitions
//! - `archiver`: Periodic lifecycle pass
//! - `subscriptions`: Attendance, saves and bans
//! - `search`: Inverted index with writer sessions
//! - `sync`: Outbox drain, reconcile sweep and rebuild
//! - `catalog`: Event create / edit / cancel and listings
//! - `accounts`: Registration, profiles and follows
//! - `api`: Axum REST layer
//! - `config`: Environment configuration
//! - `utils`: Atomic file writes, logging and paging
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use eventi::{Database, IndexSynchronizer, SearchIndex, SubscriptionManager};
//!
//! let db = Arc::new(Database::in_memory());
//! let sync = IndexSynchronizer::new(Arc::clone(&db), SearchIndex::in_memory());
//! let subscriptions = SubscriptionManager::new(Arc::clone(&db));
//! ```

pub mod accounts;
pub mod api;
pub mod archiver;
pub mod catalog;
pub mod config;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod search;
pub mod store;
pub mod subscriptions;
pub mod sync;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use accounts::Accounts;
pub use archiver::{Archiver, PassReport};
pub use catalog::EventCatalog;
pub use config::AppConfig;
pub use error::{CoreError, CoreResult};
pub use journal::JournalConfig;
pub use search::SearchIndex;
pub use store::Database;
pub use subscriptions::SubscriptionManager;
pub use sync::IndexSynchronizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
