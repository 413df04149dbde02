//! Archiver: advances event status as time passes
//!
//! Each pass runs in one fresh store transaction. Events whose status
//! moves forward are persisted; an event that ends has its live attendance
//! moved to the attendees' history. A pass commits everything or nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::{self, Transition};
use crate::store::Database;
use crate::types::{EventId, Membership, MembershipKind};

/// Above this many events, transitions are evaluated in parallel
const PARALLEL_EVALUATION_THRESHOLD: usize = 1000;

/// What one pass did to one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub event_id: EventId,
    pub transition: Transition,
    /// Attendance edges moved to history
    pub archived: usize,
}

/// Result of one archiver pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub examined: usize,
    pub outcomes: Vec<EventOutcome>,
}

impl PassReport {
    pub fn transitions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn archived(&self) -> usize {
        self.outcomes.iter().map(|o| o.archived).sum()
    }
}

pub struct Archiver {
    db: Arc<Database>,
    interval: Duration,
}

impl Archiver {
    pub fn new(db: Arc<Database>, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Run one pass at `now`
    pub fn run_pass(&self, now: DateTime<Utc>) -> CoreResult<PassReport> {
        self.db.transaction(|tx| {
            let events: Vec<_> = tx.events().collect();
            let examined = events.len();

            let evaluate = |event: &&crate::types::Event| {
                let computed = lifecycle::status_at(now, event.starts_at, event.duration());
                lifecycle::advance(event.status, computed).map(|t| (event.id, t))
            };
            let mut transitions: Vec<(EventId, Transition)> =
                if events.len() > PARALLEL_EVALUATION_THRESHOLD {
                    events.par_iter().filter_map(evaluate).collect()
                } else {
                    events.iter().filter_map(evaluate).collect()
                };
            transitions.sort_by_key(|(id, _)| *id);

            let mut outcomes = Vec::with_capacity(transitions.len());
            for (event_id, transition) in transitions {
                let mut event = tx.require_event(event_id)?.clone();
                event.status = transition.to;
                tx.put_event(event);

                let mut archived = 0;
                if transition.ends() {
                    for user_id in tx.members(event_id, MembershipKind::Attending) {
                        if tx.user(user_id).is_none() {
                            return Err(CoreError::InternalConsistency(format!(
                                "event {} lists attendee {} with no user row",
                                event_id, user_id
                            )));
                        }
                        tx.unlink(Membership::attending(user_id, event_id));
                        tx.link(Membership::attended(user_id, event_id));
                        archived += 1;
                    }
                }

                outcomes.push(EventOutcome {
                    event_id,
                    transition,
                    archived,
                });
            }

            Ok(PassReport { examined, outcomes })
        })
    }

    /// Run passes every `interval` until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Archiver started");
        let archiver = Arc::new(self);

        loop {
            let pass = Arc::clone(&archiver);
            match tokio::task::spawn_blocking(move || pass.run_pass(Utc::now())).await {
                Ok(Ok(report)) => {
                    for outcome in &report.outcomes {
                        info!(
                            event_id = %outcome.event_id,
                            from = %outcome.transition.from,
                            to = %outcome.transition.to,
                            archived = outcome.archived,
                            "Event status advanced"
                        );
                    }
                    debug!(
                        examined = report.examined,
                        transitions = report.transitions(),
                        "Archiver pass complete"
                    );
                }
                Ok(Err(CoreError::InternalConsistency(msg))) => {
                    error!(reason = %msg, "Archiver pass aborted on consistency violation");
                }
                Ok(Err(e)) => warn!(error = %e, "Archiver pass failed"),
                Err(e) => error!(error = %e, "Archiver pass panicked"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(archiver.interval) => {}
            }
        }

        info!("Archiver stopped");
    }
}
