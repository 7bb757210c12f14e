// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Usage limit exceeded: {reason}")]
    UsageLimit {
        reason: String,
        upgrade_required: bool,
    },

    #[error("Platform API error: {0}")]
    PlatformApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker message for platform rate limiting (HTTP 429).
    pub const PLATFORM_RATE_LIMIT: &'static str = "Rate limit exceeded";
    /// Marker message for rejected platform credentials (HTTP 401/403).
    pub const PLATFORM_AUTH_ERROR: &'static str = "Platform credentials rejected";

    /// Whether this error means the platform refused our credentials.
    pub fn is_platform_auth_error(&self) -> bool {
        matches!(self, AppError::PlatformApi(msg) if msg == Self::PLATFORM_AUTH_ERROR)
    }

    /// Whether this error means the platform throttled us.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::PlatformApi(msg) if msg == Self::PLATFORM_RATE_LIMIT)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upgrade_required: Option<bool>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut upgrade_required = None;
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::UsageLimit {
                reason,
                upgrade_required: upgrade,
            } => {
                upgrade_required = Some(*upgrade);
                (
                    StatusCode::FORBIDDEN,
                    "usage_limit_exceeded",
                    Some(reason.clone()),
                )
            }
            AppError::PlatformApi(msg) => {
                (StatusCode::BAD_GATEWAY, "platform_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            upgrade_required,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
