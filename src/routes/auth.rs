// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.
//!
//! A successful login or registration sets an HttpOnly session cookie
//! carrying a JWT whose subject is the identity uid. The same token is
//! returned in the body for clients that prefer a Bearer header.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{create_jwt, decode_session_token, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::CurrentUser;
use crate::services::Registration;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned after a successful login or registration.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: CurrentUser,
}

/// Register a new account and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let user = state.sessions.register(registration).await?;
    let (jar, body) = start_session(&state, jar, user)?;
    Ok((StatusCode::CREATED, jar, body))
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let user = state
        .sessions
        .login(&request.email, &request.password)
        .await?;
    start_session(&state, jar, user)
}

/// Sign out and clear the session cookie.
///
/// Without a valid session token there is nothing to sign out, but the
/// cookie is still cleared.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar)> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
    });
    let uid = token.and_then(|t| decode_session_token(&t, &state.config.jwt_signing_key));

    if let Some(uid) = uid {
        state.sessions.sign_out(&uid).await?;
    }

    let removal = session_cookie(&state.config.frontend_url, String::new());
    Ok((StatusCode::NO_CONTENT, jar.remove(removal)))
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: CurrentUser,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(&user.uid, &state.config.jwt_signing_key)?;

    let mut cookie = session_cookie(&state.config.frontend_url, token.clone());
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    Ok((jar.add(cookie), Json(SessionResponse { token, user })))
}

/// Session cookie with attributes matching the frontend's scheme.
fn session_cookie(frontend_url: &str, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(frontend_url.starts_with("https://"))
        .build()
}
