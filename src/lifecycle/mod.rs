//! Event lifecycle state machine
//!
//! ```text
//! Scheduled ──► Current ──► Ended
//!     └──────────────────────┘
//! ```
//!
//! Status is a pure function of the clock, the start and the duration.
//! Transitions only move forward.

use chrono::{DateTime, Duration, Utc};

use crate::types::EventStatus;

/// Status an event should have at `now`
///
/// An end past the representable range never arrives.
pub fn status_at(now: DateTime<Utc>, starts_at: DateTime<Utc>, duration: Duration) -> EventStatus {
    if now < starts_at {
        return EventStatus::Scheduled;
    }
    match starts_at.checked_add_signed(duration) {
        Some(ends_at) if now >= ends_at => EventStatus::Ended,
        _ => EventStatus::Current,
    }
}

/// A forward status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EventStatus,
    pub to: EventStatus,
}

impl Transition {
    /// Whether this transition ends the event, which archives its attendance
    pub fn ends(&self) -> bool {
        self.to == EventStatus::Ended && self.from != EventStatus::Ended
    }
}

/// The transition from `current` to `computed`, if it moves forward
pub fn advance(current: EventStatus, computed: EventStatus) -> Option<Transition> {
    (computed > current).then_some(Transition {
        from: current,
        to: computed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_boundaries() {
        let start = at(0);
        let hour = Duration::hours(1);

        assert_eq!(status_at(at(-1), start, hour), EventStatus::Scheduled);
        assert_eq!(status_at(at(0), start, hour), EventStatus::Current);
        assert_eq!(status_at(at(3599), start, hour), EventStatus::Current);
        assert_eq!(status_at(at(3600), start, hour), EventStatus::Ended);
    }

    #[test]
    fn test_zero_duration_skips_current() {
        let start = at(0);
        assert_eq!(status_at(at(-1), start, Duration::zero()), EventStatus::Scheduled);
        assert_eq!(status_at(at(0), start, Duration::zero()), EventStatus::Ended);

        let t = advance(EventStatus::Scheduled, EventStatus::Ended).unwrap();
        assert!(t.ends());
    }

    #[test]
    fn test_unrepresentable_end_stays_current() {
        let start = at(0);
        assert_eq!(status_at(at(-1), start, Duration::MAX), EventStatus::Scheduled);
        assert_eq!(status_at(at(10), start, Duration::MAX), EventStatus::Current);
    }

    #[test]
    fn test_advance_is_forward_only() {
        use EventStatus::*;

        assert_eq!(advance(Scheduled, Scheduled), None);
        assert_eq!(advance(Ended, Ended), None);
        assert_eq!(advance(Ended, Current), None);
        assert_eq!(advance(Current, Scheduled), None);

        let t = advance(Scheduled, Current).unwrap();
        assert!(!t.ends());
        assert!(advance(Current, Ended).unwrap().ends());
    }

    proptest! {
        #[test]
        fn prop_status_partitions_the_timeline(
            offset in -100_000i64..100_000,
            duration in 0i64..50_000,
        ) {
            let start = at(0);
            let now = at(offset);
            let status = status_at(now, start, Duration::seconds(duration));

            let expected = if offset < 0 {
                EventStatus::Scheduled
            } else if offset < duration {
                EventStatus::Current
            } else {
                EventStatus::Ended
            };
            prop_assert_eq!(status, expected);
        }

        #[test]
        fn prop_status_never_regresses_as_time_passes(
            a in -100_000i64..100_000,
            b in -100_000i64..100_000,
            duration in 0i64..50_000,
        ) {
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            let d = Duration::seconds(duration);
            prop_assert!(status_at(at(earlier), at(0), d) <= status_at(at(later), at(0), d));
        }
    }
}
