// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CurrentUser, DogsDocument};
use crate::services::{ExploreView, PositionReading, PositionReport, ProfileUpdate};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/dogs", get(get_dogs))
        .route("/api/profile", patch(update_profile))
        .route("/api/profile/photo", put(update_photo))
        .route("/api/position", post(report_position))
        .route("/api/explore", get(get_explore))
}

// ─── User Profile ────────────────────────────────────────────

/// Get the current user record.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CurrentUser>> {
    state
        .sessions
        .current_user(&user.uid)
        .map(Json)
        .ok_or(AppError::NoCurrentUser)
}

/// Get the signed-in user's dogs document.
async fn get_dogs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DogsDocument>> {
    let dogs = state.sessions.dogs(&user.uid).await?;
    Ok(Json(dogs))
}

/// Apply a partial profile update.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<CurrentUser>> {
    update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let current = state.sessions.update_profile(&user.uid, update).await?;
    Ok(Json(current))
}

/// Replace the profile photo. The body is the raw image.
async fn update_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<CurrentUser>> {
    let current = state.sessions.update_photo(&user.uid, body.to_vec()).await?;
    Ok(Json(current))
}

// ─── Explore Map ─────────────────────────────────────────────

/// Report a device geolocation fix.
async fn report_position(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(reading): Json<PositionReading>,
) -> Result<Json<PositionReport>> {
    let report = state.sessions.report_position(&user.uid, reading).await?;
    Ok(Json(report))
}

/// Map view centered on the user's last known position.
async fn get_explore(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ExploreView>> {
    state.sessions.explore_view(&user.uid).map(Json)
}
