//! Transactional store
//!
//! ```text
//! transaction(f)
//!   │ lock ──► f(&mut Transaction) ──► Err ─► revert undo log
//!   │               │ Ok                        ▲
//!   │               ▼                           │ append failed
//!   │   journal.append(changes) + fsync ────────┘
//!   │               │
//!   └──── keep changes, unlock
//! ```
//!
//! Transactions run one at a time under a single lock, so every
//! check-then-write sequence is serializable. Changes are applied in place
//! and reverted from an undo log unless the transaction commits; a
//! transaction that returns an error leaves no trace. A commit is kept only
//! after its journal line is durable.

mod tables;
mod transaction;

pub use tables::Tables;
pub use transaction::Transaction;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::journal::{Journal, JournalConfig};
use crate::types::default_categories;
use crate::utils::cleanup_temp_files;

struct Inner {
    tables: Tables,
    /// `None` for an in-memory store
    journal: Option<Journal>,
}

/// The relational store shared by every service
pub struct Database {
    inner: Mutex<Inner>,
}

impl Database {
    /// A store with no persistence, seeded with the default categories
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tables: Tables::seeded(),
                journal: None,
            }),
        }
    }

    /// Open a journaled store, replaying snapshot and journal
    pub fn open(config: JournalConfig) -> CoreResult<Self> {
        std::fs::create_dir_all(config.data_dir()).map_err(crate::journal::JournalError::from)?;

        for dir in [config.data_dir().to_path_buf(), config.snapshots_dir()] {
            if dir.exists() {
                match cleanup_temp_files(&dir) {
                    Ok(0) => {}
                    Ok(n) => info!(dir = %dir.display(), removed = n, "Removed leftover temp files"),
                    Err(e) => warn!(dir = %dir.display(), error = %e, "Temp file cleanup failed"),
                }
            }
        }

        let mut journal = Journal::with_config(config);
        let recovered = journal.recover()?;

        let mut tables = match recovered.snapshot {
            Some((meta, records)) => {
                info!(
                    last_commit_id = meta.last_commit_id,
                    records = meta.record_count,
                    "Loaded snapshot"
                );
                Tables::from_records(records)
            }
            None => Tables::default(),
        };

        for commit in &recovered.commits {
            for change in &commit.changes {
                tables.apply(change);
            }
        }
        info!(
            replayed = recovered.commits.len(),
            next_commit_id = journal.next_commit_id(),
            events = tables.event_count(),
            "Store recovered"
        );

        let db = Self {
            inner: Mutex::new(Inner {
                tables,
                journal: Some(journal),
            }),
        };

        let empty = db.read(|t| t.categories().next().is_none());
        if empty {
            db.transaction(|tx| {
                for category in default_categories() {
                    tx.put_category(category);
                }
                Ok(())
            })?;
        }

        Ok(db)
    }

    /// Run `f` against the committed tables
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let inner = self.inner.lock();
        f(&inner.tables)
    }

    /// Run `f` as one serializable transaction
    ///
    /// On `Ok` every staged change commits atomically; on `Err` none do.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Transaction<'_>) -> CoreResult<T>) -> CoreResult<T> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let mut tx = Transaction::new(&mut inner.tables);
        let out = f(&mut tx)?;

        if tx.is_empty() {
            return Ok(out);
        }

        if let Some(journal) = inner.journal.as_mut() {
            let commit = journal.append(tx.changes().to_vec())?;
            debug!(commit_id = commit.commit_id, changes = commit.changes.len(), "Committed");
        }
        tx.commit();

        if let Some(journal) = inner.journal.as_mut() {
            if journal.should_snapshot() {
                match journal.snapshot(&inner.tables.records()) {
                    Ok(meta) => info!(
                        last_commit_id = meta.last_commit_id,
                        records = meta.record_count,
                        "Snapshot created"
                    ),
                    Err(e) => warn!(error = %e, "Snapshot failed, journal keeps growing"),
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConflictReason, CoreError};
    use crate::types::{Follow, IndexOp, Membership};
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn test_failed_transaction_leaves_no_trace() {
        let db = Database::in_memory();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let result: CoreResult<()> = db.transaction(|tx| {
            tx.follow(Follow::new(a, b));
            Err(CoreError::Conflict(ConflictReason::AlreadyFollowing))
        });

        assert!(result.is_err());
        assert!(!db.read(|t| t.is_following(a, b)));
    }

    #[test]
    fn test_failed_transaction_reverts_edits_to_existing_rows() {
        let db = Database::in_memory();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let event = Uuid::new_v4();
        let seq = db
            .transaction(|tx| {
                tx.follow(Follow::new(a, b));
                tx.link(Membership::saved(a, event));
                Ok(tx.enqueue_index(event, IndexOp::Upsert))
            })
            .unwrap();

        let result: CoreResult<()> = db.transaction(|tx| {
            tx.unfollow(Follow::new(a, b));
            tx.unlink(Membership::saved(a, event));
            tx.enqueue_index(event, IndexOp::Delete);
            tx.delete_event(event);
            Err(CoreError::InvalidInput("rejected".to_string()))
        });

        assert!(result.is_err());
        db.read(|t| {
            assert!(t.is_following(a, b));
            assert!(t.has(&Membership::saved(a, event)));
            let pending = t.pending_index_ops();
            assert_eq!(pending.len(), 1);
            assert_eq!((pending[0].seq, pending[0].op), (seq, IndexOp::Upsert));
            assert_eq!(t.next_outbox_seq(), seq + 1);
        });
    }

    #[test]
    fn test_panicking_transaction_leaves_no_trace() {
        let db = Database::in_memory();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            db.transaction(|tx| -> CoreResult<()> {
                tx.follow(Follow::new(a, b));
                panic!("handler bug");
            })
        }));

        assert!(outcome.is_err());
        assert!(!db.read(|t| t.is_following(a, b)));
        db.transaction(|tx| {
            assert!(tx.follow(Follow::new(a, b)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_journal_failure_reverts_transaction() {
        let dir = TempDir::new().unwrap();
        let config = JournalConfig::new(dir.path());
        let db = Database::open(config.clone()).unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        std::fs::remove_file(config.journal_path()).unwrap();
        std::fs::create_dir(config.journal_path()).unwrap();

        let err = db
            .transaction(|tx| {
                tx.follow(Follow::new(a, b));
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, CoreError::Journal(_)));
        assert!(!db.read(|t| t.is_following(a, b)));
    }

    #[test]
    fn test_transaction_reads_its_own_writes() {
        let db = Database::in_memory();
        let (user, event) = (Uuid::new_v4(), Uuid::new_v4());

        let inserted_twice = db
            .transaction(|tx| {
                let first = tx.link(Membership::saved(user, event));
                let second = tx.link(Membership::saved(user, event));
                Ok(first && second)
            })
            .unwrap();

        assert!(!inserted_twice);
        assert!(db.read(|t| t.has(&Membership::saved(user, event))));
    }

    #[test]
    fn test_open_seeds_and_replays() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let event = Uuid::new_v4();

        {
            let db = Database::open(JournalConfig::new(dir.path())).unwrap();
            assert_eq!(db.read(|t| t.categories().count()), 8);
            db.transaction(|tx| {
                tx.follow(Follow::new(a, b));
                tx.enqueue_index(event, IndexOp::Upsert);
                Ok(())
            })
            .unwrap();
        }

        let db = Database::open(JournalConfig::new(dir.path())).unwrap();
        assert!(db.read(|t| t.is_following(a, b)));
        assert_eq!(db.read(|t| t.pending_index_ops().len()), 1);
        // Categories are seeded once, not on every open
        assert_eq!(db.read(|t| t.categories().count()), 8);
    }

    #[test]
    fn test_snapshot_then_replay() {
        let dir = TempDir::new().unwrap();
        let config = JournalConfig::new(dir.path()).with_snapshot_threshold(2);
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        {
            let db = Database::open(config.clone()).unwrap();
            for pair in users.windows(2) {
                db.transaction(|tx| {
                    tx.follow(Follow::new(pair[0], pair[1]));
                    Ok(())
                })
                .unwrap();
            }
        }

        assert!(config.latest_snapshot_path().exists());

        let db = Database::open(config).unwrap();
        for pair in users.windows(2) {
            assert!(db.read(|t| t.is_following(pair[0], pair[1])));
        }
    }

    #[test]
    fn test_outbox_sequence_survives_restart() {
        let dir = TempDir::new().unwrap();
        let event = Uuid::new_v4();

        let first = {
            let db = Database::open(JournalConfig::new(dir.path())).unwrap();
            let seq = db
                .transaction(|tx| Ok(tx.enqueue_index(event, IndexOp::Upsert)))
                .unwrap();
            db.transaction(|tx| {
                tx.ack_index(seq);
                Ok(())
            })
            .unwrap();
            seq
        };

        let db = Database::open(JournalConfig::new(dir.path())).unwrap();
        let second = db
            .transaction(|tx| Ok(tx.enqueue_index(event, IndexOp::Upsert)))
            .unwrap();
        assert!(second > first);
    }
}
