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

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The provider rejected the refresh token; the user has to reconnect.
    #[error("Calendar integration expired")]
    IntegrationExpired,

    /// Network failure or timeout talking to a provider. Safe to retry.
    #[error("Transient provider error: {0}")]
    TransientProvider(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid provider response: {0}")]
    ProviderResponseInvalid(String),

    #[error("Remote function error: {0}")]
    RemoteFunction(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Server misconfigured: {0}")]
    Misconfigured(&'static str),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

impl AppError {
    /// Whether the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::TransientProvider(_) | AppError::ProviderUnavailable(_)
        )
    }

    /// Machine-readable error code used in JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::IntegrationExpired => "reconnect_required",
            AppError::TransientProvider(_) => "provider_timeout",
            AppError::ProviderUnavailable(_) => "provider_unavailable",
            AppError::ProviderResponseInvalid(_) => "provider_invalid_response",
            AppError::RemoteFunction(_) => "remote_function_error",
            AppError::Database(_) => "database_error",
            AppError::Misconfigured(_) => "misconfigured",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Human-readable message that is safe to show to end users.
    ///
    /// Upstream details (provider bodies, SQL errors) stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Please sign in to continue.".to_string(),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::IntegrationExpired => {
                "Your Google Calendar connection has expired. Please reconnect it.".to_string()
            }
            AppError::TransientProvider(_) | AppError::ProviderUnavailable(_) => {
                "Google Calendar is temporarily unavailable. Please try again.".to_string()
            }
            AppError::ProviderResponseInvalid(_) => {
                "Google Calendar returned an unexpected response.".to_string()
            }
            AppError::RemoteFunction(_) => "A background service failed to respond.".to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "Something went wrong on our side.".to_string()
            }
            AppError::Misconfigured(_) => "This feature is not configured.".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IntegrationExpired => StatusCode::CONFLICT,
            AppError::TransientProvider(_)
            | AppError::ProviderUnavailable(_)
            | AppError::ProviderResponseInvalid(_)
            | AppError::RemoteFunction(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Misconfigured(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Database(msg) => tracing::error!(error = %msg, "Database error"),
            AppError::Internal(err) => tracing::error!(error = %err, "Internal server error"),
            AppError::Misconfigured(what) => tracing::error!(missing = %what, "Server misconfigured"),
            err if status == StatusCode::BAD_GATEWAY => {
                tracing::warn!(error = %err, "Upstream failure")
            }
            _ => {}
        }

        let body = ErrorResponse {
            success: false,
            error: self.code(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
