// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.
//!
//! Sessions are access tokens issued by the hosted auth service: HS256 JWTs
//! signed with `SUPABASE_JWT_SECRET`, audience `authenticated`, with the
//! user's UUID in `sub`.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sb-access-token";

const SESSION_AUDIENCE: &str = "authenticated";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Token from an `Authorization: Bearer` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => bearer_token(request.headers())
            .ok_or(AppError::Unauthorized)?
            .to_string(),
    };

    let auth_user =
        verify_session(&token, &state.config.supabase_jwt_secret).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Validate a session token and extract the user.
pub fn verify_session(token: &str, secret: &[u8]) -> Option<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SESSION_AUDIENCE]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| tracing::debug!(error = %e, "Rejected session token"))
        .ok()?;

    let user_id = token_data.claims.sub.parse().ok()?;
    Some(AuthUser {
        user_id,
        email: token_data.claims.email,
    })
}

/// Create a session token the way the auth service does (local tooling and tests).
pub fn create_session_jwt(
    user_id: Uuid,
    email: Option<&str>,
    secret: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        aud: SESSION_AUDIENCE.to_string(),
        iat: now,
        exp: now + 60 * 60, // 1 hour
        email: email.map(str::to_string),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}
