//! Category endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use super::{ApiResponse, PageParams};
use crate::api::state::AppState;
use crate::error::CoreError;
use crate::types::CategoryId;

/// GET /api/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::list(state.catalog.categories()))
}

/// GET /api/categories/:id/events
pub async fn category_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CategoryId>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, CoreError> {
    let events = match params.bounds() {
        Some((start, end)) => state.catalog.events_in_category_page(id, start, end)?,
        None => state.catalog.events_in_category(id)?,
    };
    Ok(Json(ApiResponse::list(events)))
}
