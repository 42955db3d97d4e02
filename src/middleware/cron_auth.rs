// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler authentication middleware.

use crate::error::AppError;
use crate::middleware::auth::bearer_token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <CRON_SECRET>` when a secret is configured.
///
/// Without `CRON_SECRET` the route is open.
pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let authorized = bearer_token(request.headers())
        .map(|provided| bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false);

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Blocked scheduler request with bad secret");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
