// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar OAuth routes.
//!
//! The authorization `state` is `base64url(user_id|issued_at_hex|nonce_hex|signature_hex)`
//! with an HMAC-SHA256 signature. It is also set as a short-lived cookie
//! scoped to the callback path; the callback requires both to match.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Cookie holding the pending authorization state.
pub const STATE_COOKIE: &str = "google_oauth_state";

/// How long an authorization attempt stays valid.
pub const STATE_TTL_SECS: i64 = 10 * 60;

const CALLBACK_PATH: &str = "/api/auth/google/callback";

/// Public routes: Google redirects the browser here.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(CALLBACK_PATH, get(oauth_callback))
}

/// Routes that need a session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/auth/google/calendar",
        get(oauth_start).delete(disconnect),
    )
}

/// 302 to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn state_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(STATE_TTL_SECS))
        .build()
}

fn state_cookie_removal(config: &Config) -> Cookie<'static> {
    Cookie::build(STATE_COOKIE)
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .build()
}

/// Start OAuth flow - redirect to the Google consent screen.
async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Response)> {
    let calendars = state.calendars()?;

    let oauth_state = sign_state(
        user.user_id,
        Utc::now().timestamp(),
        &state.config.oauth_state_key,
    )?;
    let auth_url = calendars.google().authorization_url(&oauth_state);

    tracing::info!(user_id = %user.user_id, "Starting Google OAuth flow");

    let jar = jar.add(state_cookie(&state.config, oauth_state));
    Ok((jar, found(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, store the integration.
///
/// Always redirects back to the calendar dashboard.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Response) {
    let cookie_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(state_cookie_removal(&state.config));

    let dashboard = format!("{}/dashboard/calendar", state.config.app_url);
    let redirect = match complete_authorization(&state, params, cookie_state.as_deref()).await {
        Ok(()) => format!("{}?google=connected", dashboard),
        Err(code) => format!("{}?error={}", dashboard, code),
    };

    (jar, found(&redirect))
}

/// Returns a short error code for the redirect on failure.
async fn complete_authorization(
    state: &AppState,
    params: CallbackParams,
    cookie_state: Option<&str>,
) -> std::result::Result<(), &'static str> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Google authorization was not granted");
        return Err("access_denied");
    }

    let calendars = state.calendars().map_err(|_| "misconfigured")?;

    let returned_state = params.state.ok_or("invalid_state")?;
    if cookie_state != Some(returned_state.as_str()) {
        tracing::warn!("OAuth state does not match cookie");
        return Err("invalid_state");
    }

    let user_id = verify_state(
        &returned_state,
        &state.config.oauth_state_key,
        Utc::now().timestamp(),
    )
    .ok_or("invalid_state")?;

    let code = params.code.ok_or("missing_code")?;

    let grant = calendars.google().exchange_code(&code).await.map_err(|e| {
        tracing::warn!(user_id = %user_id, error = %e, "Authorization code exchange failed");
        "token_exchange_failed"
    })?;

    calendars.connect(user_id, grant).await.map_err(|e| {
        tracing::error!(user_id = %user_id, error = %e, "Failed to store Google integration");
        "connection_failed"
    })?;

    Ok(())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DisconnectResponse {
    pub success: bool,
    pub message: String,
}

/// Disconnect Google Calendar: revoke at Google and forget the tokens.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DisconnectResponse>> {
    state.calendars()?.disconnect(user.user_id).await?;

    Ok(Json(DisconnectResponse {
        success: true,
        message: "Google Calendar disconnected".to_string(),
    }))
}

/// Build a signed state value for `user_id` issued at `issued_at` (Unix seconds).
pub fn sign_state(user_id: Uuid, issued_at: i64, key: &[u8]) -> Result<String> {
    let nonce: [u8; 16] = rand::random();
    let payload = format!("{}|{:x}|{}", user_id, issued_at, hex::encode(nonce));

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age, returning the user the flow was started for.
pub fn verify_state(state: &str, key: &[u8], now: i64) -> Option<Uuid> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    let (payload, signature_hex) = decoded.rsplit_once('|')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let mut parts = payload.split('|');
    let user_id = parts.next()?.parse().ok()?;
    let issued_at = i64::from_str_radix(parts.next()?, 16).ok()?;

    if !(0..=STATE_TTL_SECS).contains(&(now - issued_at)) {
        tracing::warn!(issued_at, "OAuth state expired");
        return None;
    }

    Some(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"state_key";

    #[test]
    fn test_verify_state_success() {
        let user_id = Uuid::new_v4();
        let signed = sign_state(user_id, 1_000_000, KEY).unwrap();

        assert_eq!(verify_state(&signed, KEY, 1_000_000), Some(user_id));
        assert_eq!(verify_state(&signed, KEY, 1_000_000 + STATE_TTL_SECS), Some(user_id));
    }

    #[test]
    fn test_verify_state_expired() {
        let signed = sign_state(Uuid::new_v4(), 1_000_000, KEY).unwrap();
        assert_eq!(verify_state(&signed, KEY, 1_000_000 + STATE_TTL_SECS + 1), None);
    }

    #[test]
    fn test_verify_state_wrong_key() {
        let signed = sign_state(Uuid::new_v4(), 1_000_000, KEY).unwrap();
        assert_eq!(verify_state(&signed, b"wrong_key", 1_000_000), None);
    }

    #[test]
    fn test_verify_state_tampered_user() {
        let signed = sign_state(Uuid::new_v4(), 1_000_000, KEY).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&signed).unwrap()).unwrap();
        let (_, rest) = decoded.split_once('|').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(format!("{}|{}", Uuid::new_v4(), rest));

        assert_eq!(verify_state(&forged, KEY, 1_000_000), None);
    }

    #[test]
    fn test_verify_state_malformed() {
        assert_eq!(verify_state("not base64 !!", KEY, 0), None);
        assert_eq!(verify_state(&URL_SAFE_NO_PAD.encode("invalid|format"), KEY, 0), None);
    }

    #[test]
    fn test_states_are_unique() {
        let user_id = Uuid::new_v4();
        assert_ne!(
            sign_state(user_id, 1, KEY).unwrap(),
            sign_state(user_id, 1, KEY).unwrap()
        );
    }
}
