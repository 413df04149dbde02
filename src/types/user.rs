//! User rows and profile payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a user
pub type UserId = Uuid;

/// User row in the store
///
/// Organized, attended, saved and history lists as well as followers and
/// following are views over edge sets, not fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "profilePicture", default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<NaiveDate>,
}

impl NewUser {
    pub fn new(user_name: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: format!("{}@example.com", user_name.to_lowercase()),
            biography: None,
            birth_date: None,
        }
    }
}

/// Profile fields a user may change; `None` leaves a field untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileEdit {
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: Option<String>,
}

/// Public user details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: UserId,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub followers: usize,
    pub following: usize,
}
