//! Event categories

use serde::{Deserialize, Serialize};

/// Identity of a category
pub type CategoryId = i32;

/// Category row; its events are a view over `Event::category_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: CategoryId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Categories seeded into a fresh store (id 6 was never assigned)
pub fn default_categories() -> Vec<Category> {
    [
        (1, "Sports"),
        (2, "Culture"),
        (3, "Youth"),
        (4, "Business"),
        (5, "Music"),
        (7, "Health"),
        (8, "History"),
        (9, "General"),
    ]
    .into_iter()
    .map(|(id, name)| Category::new(id, name))
    .collect()
}
