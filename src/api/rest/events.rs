//! Event catalog endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{ActingUser, ApiResponse, Created, PageParams};
use crate::api::state::AppState;
use crate::error::CoreError;
use crate::types::{EventDraft, EventId};

/// GET /api/events - All events, or a `[start, end)` page
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let events = match params.bounds() {
        Some((start, end)) => state.catalog.events_page(start, end),
        None => state.catalog.list_events(),
    };
    Json(ApiResponse::list(events))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Json(draft): Json<EventDraft>,
) -> Result<impl IntoResponse, CoreError> {
    let id = state.catalog.create_event(actor, draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(Created { id }))))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::new(state.catalog.get_event(id)?)))
}

/// PUT /api/events/:id
pub async fn edit_event(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
    Json(draft): Json<EventDraft>,
) -> Result<impl IntoResponse, CoreError> {
    state.catalog.edit_event(actor, id, draft).await?;
    Ok(Json(ApiResponse::new(state.catalog.get_event(id)?)))
}

/// DELETE /api/events/:id
pub async fn cancel_event(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, CoreError> {
    state.catalog.cancel_event(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CoverBody {
    pub cover: Option<String>,
}

/// PUT /api/events/:id/cover
pub async fn update_cover(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EventId>,
    Json(body): Json<CoverBody>,
) -> Result<impl IntoResponse, CoreError> {
    state.catalog.update_cover(actor, id, body.cover)?;
    Ok(Json(ApiResponse::new(state.catalog.get_event(id)?)))
}
