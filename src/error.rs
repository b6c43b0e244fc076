// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::backend::BackendError;
use crate::services::photo::PhotoError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication failures with their user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect password or e-mail. Please try again.")]
    InvalidCredential,

    #[error("Too many attempts. Please try again later.")]
    TooManyRequests,

    #[error("Email already in use. Please try another one.")]
    EmailInUse,

    #[error("Password is too weak. Please choose a stronger password.")]
    WeakPassword,

    #[error("Invalid email format. Please check your email.")]
    InvalidEmail,

    /// Sign-in succeeded but there is no profile document for the account.
    #[error("User data not found. Please contact support.")]
    UserDataNotFound,

    #[error("An unexpected error occurred. Please try again. Error code: {0}")]
    Unexpected(String),
}

impl AuthError {
    /// Map an identity-service error code to an [`AuthError`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
                Self::InvalidCredential
            }
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/email-already-in-use" => Self::EmailInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/user-data-not-found" => Self::UserDataNotFound,
            other => Self::Unexpected(other.to_string()),
        }
    }

    /// Stable error code, as reported by the identity service.
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidCredential => "auth/invalid-credential",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::EmailInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::UserDataNotFound => "auth/user-data-not-found",
            Self::Unexpected(code) => code,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredential | Self::UserDataNotFound => StatusCode::UNAUTHORIZED,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailInUse => StatusCode::CONFLICT,
            Self::WeakPassword | Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::Unexpected(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Identity { code } => Self::from_code(&code),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// Valid session token, but the session was signed out or never loaded.
    #[error("No current user")]
    NoCurrentUser,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Failed to update profile: {0}")]
    ProfileUpdate(String),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("Failed to sign out. Please try again.")]
    SignOut(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None, None),
            AppError::NoCurrentUser => (
                StatusCode::UNAUTHORIZED,
                "no_current_user",
                None,
                Some(self.to_string()),
            ),
            AppError::Auth(err) => (
                err.status(),
                "auth_error",
                Some(err.code().to_string()),
                Some(err.to_string()),
            ),
            AppError::ProfileUpdate(msg) => {
                tracing::warn!(error = %msg, "Profile update failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "profile_update_failed",
                    None,
                    Some(self.to_string()),
                )
            }
            AppError::Photo(err) => {
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    tracing::warn!(error = %err, "Photo update failed");
                    StatusCode::BAD_GATEWAY
                };
                (status, "photo_update_failed", None, Some(err.to_string()))
            }
            AppError::SignOut(msg) => {
                tracing::warn!(error = %msg, "Sign-out failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "sign_out_failed",
                    None,
                    Some(self.to_string()),
                )
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found", None, Some(msg.clone()))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", None, Some(msg.clone()))
            }
            AppError::Backend(BackendError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", None, Some(msg.clone()))
            }
            AppError::Backend(err) => {
                tracing::error!(error = %err, "Backend error");
                (StatusCode::BAD_GATEWAY, "backend_error", None, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None, None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
