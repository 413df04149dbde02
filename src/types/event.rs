//! Event rows and the payloads built from them

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{is_zero, CategoryId, UserId};

/// Identity of an event
pub type EventId = Uuid;

/// Lifecycle status of an event
///
/// Variants are declared in lifecycle order so that `Ord` follows time:
/// `Scheduled < Current < Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Current,
    Ended,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "scheduled"),
            EventStatus::Current => write!(f, "current"),
            EventStatus::Ended => write!(f, "ended"),
        }
    }
}

/// Longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Both coordinates are finite and inside their ranges
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Event row in the store
///
/// Attendees, bans and saves are not stored here; they are views over the
/// membership edge set (see [`super::Membership`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "durationSecs")]
    pub duration_secs: i64,
    pub price: f64,
    pub location: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: CategoryId,
    #[serde(rename = "organizerId")]
    pub organizer_id: UserId,
    /// 0 means unlimited
    #[serde(rename = "maxAttendees", default, skip_serializing_if = "is_zero")]
    pub max_attendees: u32,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event row from a validated draft
    pub fn from_draft(
        id: EventId,
        organizer_id: UserId,
        draft: &EventDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            starts_at: draft.starts_at,
            duration_secs: draft.duration_secs,
            price: draft.price,
            location: draft.location,
            cover: draft.cover.clone(),
            category_id: draft.category_id,
            organizer_id,
            max_attendees: draft.max_attendees,
            status: EventStatus::Scheduled,
            created_at,
        }
    }

    /// Saturates at `Duration::MAX` for rows written before durations were bounded
    pub fn duration(&self) -> Duration {
        Duration::try_seconds(self.duration_secs).unwrap_or(Duration::MAX)
    }

    /// `None` when the end is past the representable range
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at.checked_add_signed(self.duration())
    }

    /// Whether `max_attendees` limits this event
    pub fn has_capacity_limit(&self) -> bool {
        self.max_attendees > 0
    }
}

/// Longest accepted event duration (ten years)
pub const MAX_DURATION_SECS: i64 = 10 * 366 * 24 * 3600;

/// Organizer-supplied fields for creating or editing an event
///
/// `starts_at` accepts any RFC 3339 offset and is held in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "durationSecs", default)]
    pub duration_secs: i64,
    #[serde(default)]
    pub price: f64,
    pub location: GeoPoint,
    #[serde(rename = "categoryId")]
    pub category_id: CategoryId,
    #[serde(rename = "maxAttendees", default)]
    pub max_attendees: u32,
    #[serde(default)]
    pub cover: Option<String>,
}

impl EventDraft {
    /// Check field-level constraints, returning the first violation
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.duration_secs < 0 {
            return Err("duration must not be negative".to_string());
        }
        if self.duration_secs > MAX_DURATION_SECS {
            return Err(format!("duration must not exceed {} seconds", MAX_DURATION_SECS));
        }
        if self.starts_at.checked_add_signed(Duration::seconds(self.duration_secs)).is_none() {
            return Err("event end is out of range".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("price must be a non-negative amount".to_string());
        }
        if !self.location.is_valid() {
            return Err("location is outside valid coordinates".to_string());
        }
        Ok(())
    }
}

/// Event details returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub id: EventId,
    pub title: String,
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "durationSecs")]
    pub duration_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(rename = "coverUrl", skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub location: GeoPoint,
    #[serde(rename = "organizerId")]
    pub organizer_id: UserId,
    #[serde(rename = "numberOfSubscribers")]
    pub subscribers: usize,
    #[serde(rename = "maxAttendees")]
    pub max_attendees: u32,
    #[serde(rename = "categoryId")]
    pub category_id: CategoryId,
    #[serde(rename = "categoryName")]
    pub category_name: String,
    pub status: EventStatus,
    #[serde(rename = "dateAdded")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> EventDraft {
        EventDraft {
            title: "Jazz Night".to_string(),
            description: Some("Live quartet".to_string()),
            starts_at: Utc.with_ymd_and_hms(2026, 5, 1, 20, 0, 0).unwrap(),
            duration_secs: 3 * 3600,
            price: 15.0,
            location: GeoPoint::new(3.05, 36.75),
            category_id: 5,
            max_attendees: 0,
            cover: None,
        }
    }

    #[test]
    fn test_status_orders_by_lifecycle() {
        assert!(EventStatus::Scheduled < EventStatus::Current);
        assert!(EventStatus::Current < EventStatus::Ended);
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut blank = draft();
        blank.title = "   ".to_string();
        assert!(blank.validate().is_err());

        let mut negative = draft();
        negative.duration_secs = -1;
        assert!(negative.validate().is_err());

        let mut endless = draft();
        endless.duration_secs = 9_000_000_000_000;
        assert!(endless.validate().is_err());

        let mut longest = draft();
        longest.duration_secs = MAX_DURATION_SECS;
        assert!(longest.validate().is_ok());

        let mut far = draft();
        far.location = GeoPoint::new(200.0, 0.0);
        assert!(far.validate().is_err());
    }

    #[test]
    fn test_offset_start_is_normalized_to_utc() {
        let json = serde_json::json!({
            "title": "Dawn run",
            "startsAt": "2026-05-01T08:00:00+02:00",
            "location": { "longitude": 0.0, "latitude": 0.0 },
            "categoryId": 1
        });
        let draft: EventDraft = serde_json::from_value(json).unwrap();
        assert_eq!(draft.starts_at, Utc.with_ymd_and_hms(2026, 5, 1, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_unbounded_row_duration_saturates() {
        let mut event = Event::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft(), Utc::now());
        event.duration_secs = i64::MAX;
        assert_eq!(event.duration(), Duration::MAX);
        assert_eq!(event.ends_at(), None);
    }

    #[test]
    fn test_ends_at() {
        let event = Event::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft(), Utc::now());
        assert_eq!(event.ends_at(), Some(Utc.with_ymd_and_hms(2026, 5, 1, 23, 0, 0).unwrap()));
        assert_eq!(event.status, EventStatus::Scheduled);
    }
}
