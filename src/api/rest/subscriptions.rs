//! Attendance, save and ban endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{ActingUser, ApiResponse, PageParams};
use crate::api::state::AppState;
use crate::error::CoreError;
use crate::types::{EventId, UserId};

/// POST /api/events/:id/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.subscribe(actor, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/unsubscribe
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.unsubscribe(actor, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/save
pub async fn save(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.save(actor, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/unsave
pub async fn unsave(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.unsave(actor, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/kick/:user
pub async fn kick(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path((id, subject)): Path<(EventId, UserId)>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.kick(actor, subject, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/ban/:user
pub async fn ban(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path((id, subject)): Path<(EventId, UserId)>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.ban(actor, subject, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/unban/:user
pub async fn unban(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path((id, subject)): Path<(EventId, UserId)>,
) -> Result<impl IntoResponse, CoreError> {
    state.subscriptions.unban(actor, subject, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/events/:id/subscribers
pub async fn subscribers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<EventId>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, CoreError> {
    let users = match params.bounds() {
        Some((start, end)) => state.subscriptions.subscribers_page(id, start, end)?,
        None => state.subscriptions.subscribers(id)?,
    };
    Ok(Json(ApiResponse::list(users)))
}

/// GET /api/events/:id/banlist - Organizer only
pub async fn ban_list(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.subscriptions.ban_list(actor, id)?)))
}
