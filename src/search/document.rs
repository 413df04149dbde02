use serde::{Deserialize, Serialize};

use crate::types::{Category, Event, EventId, User};

/// The searchable projection of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "organizerUserName", default)]
    pub organizer_user_name: String,
    #[serde(rename = "organizerFullName", default)]
    pub organizer_full_name: String,
}

impl IndexDocument {
    /// Build the document from the event row and its joined rows
    ///
    /// Missing category or organizer rows leave the matching fields empty.
    pub fn from_event(event: &Event, category: Option<&Category>, organizer: Option<&User>) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            category: category.map(|c| c.name.clone()).unwrap_or_default(),
            organizer_user_name: organizer.map(|u| u.user_name.clone()).unwrap_or_default(),
            organizer_full_name: organizer.map(|u| u.full_name()).unwrap_or_default(),
        }
    }

    /// Searchable text fields
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.title,
            &self.description,
            &self.category,
            &self.organizer_user_name,
            &self.organizer_full_name,
        ]
    }

    pub fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.fields().into_iter().flat_map(tokenize)
    }
}

/// Tokenize text into searchable tokens
/// Splits on whitespace and punctuation, lowercases
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| s.len() >= 2) // Skip very short tokens
        .map(|s| s.to_string())
        .collect()
}
