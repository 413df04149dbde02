//! Search endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::ApiResponse;
use crate::api::state::AppState;
use crate::error::CoreError;

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query string
    #[serde(default)]
    pub q: String,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /api/search - Ranked event search
pub async fn search_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, CoreError> {
    if params.q.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "query parameter 'q' is required".to_string(),
        ));
    }

    let events = state.catalog.search(&params.q, params.limit.min(1000));
    Ok(Json(ApiResponse::list(events)))
}
