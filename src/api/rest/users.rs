//! Account, profile and follow endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{ActingUser, ApiResponse, Created};
use crate::api::state::AppState;
use crate::error::CoreError;
use crate::types::{NewUser, ProfileEdit, UserId};

/// POST /api/users - Register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> Result<impl IntoResponse, CoreError> {
    let id = state.accounts.register(new_user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(Created { id }))))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::new(state.accounts.user_details(id)?)))
}

/// PUT /api/profile - Edit the acting user's profile
pub async fn edit_profile(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Json(edit): Json<ProfileEdit>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::new(state.accounts.edit_profile(actor, edit).await?)))
}

/// POST /api/users/:id/follow
pub async fn follow(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(target): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    state.accounts.follow(actor, target)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/:id/unfollow
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
    Path(target): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    state.accounts.unfollow(actor, target)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/:id/followers
pub async fn followers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.accounts.followers(id)?)))
}

/// GET /api/users/:id/following
pub async fn following(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.accounts.following(id)?)))
}

/// GET /api/users/:id/events/organized
pub async fn organized_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.subscriptions.organized_events(id)?)))
}

/// GET /api/users/:id/events/attended
pub async fn attended_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.subscriptions.attended_events(id)?)))
}

/// GET /api/users/:id/events/saved
pub async fn saved_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.subscriptions.saved_events(id)?)))
}

/// GET /api/users/:id/events/history
pub async fn events_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(ApiResponse::list(state.subscriptions.events_history(id)?)))
}
