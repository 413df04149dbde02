//! REST API module for HTTP endpoints
//!
//! - `/api/events` - Event catalog
//! - `/api/events/:id/...` - Attendance, saves and bans
//! - `/api/categories` - Categories and their events
//! - `/api/users`, `/api/profile` - Accounts and the follow graph
//! - `/api/search` - Full-text event search

pub mod categories;
pub mod events;
pub mod search;
pub mod subscriptions;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::UserId;

/// Header carrying the authenticated user's id
pub const USER_HEADER: &str = "x-user-id";

/// Half-open `[start, end)` paging parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl PageParams {
    /// Bounds to page with, or `None` when neither bound was given
    pub fn bounds(&self) -> Option<(usize, usize)> {
        if self.start.is_none() && self.end.is_none() {
            return None;
        }
        Some((self.start.unwrap_or(0), self.end.unwrap_or(usize::MAX)))
    }
}

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Total count (for list responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, total: None }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        let total = data.len();
        Self {
            data,
            total: Some(total),
        }
    }
}

/// Id of a newly created resource
#[derive(Debug, Serialize)]
pub struct Created<T> {
    pub id: T,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "UNAUTHORIZED".to_string(),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::InternalConsistency(_) | CoreError::Journal(_) | CoreError::Index(_) => {
                error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ApiError {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// The authenticated user making the request
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ApiError::unauthorized("missing x-user-id header")),
                )
            })?;

        Uuid::parse_str(value.trim()).map(ActingUser).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::unauthorized("malformed x-user-id header")),
            )
        })
    }
}
