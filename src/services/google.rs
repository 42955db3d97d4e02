// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth and Calendar API client.
//!
//! Handles:
//! - Authorization URL construction (offline access, so we get a refresh token)
//! - Authorization code exchange and token refresh
//! - Calendar list fetching (paginated)
//! - Token revocation on disconnect
//!
//! Every request runs on a client with a request timeout; a timeout is
//! reported as a transient provider error.

use crate::config::Config;
use crate::error::AppError;
use crate::time_utils::expiry_from_now;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Read-only access is all the schedule import needs.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Upper bound on calendarList pages fetched per listing.
const MAX_CALENDAR_PAGES: usize = 10;

/// OAuth client credentials registered with Google.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleCredentials {
    /// `None` when the client id or secret is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            client_id: config.google_client_id.clone()?,
            client_secret: config.google_client_secret.clone()?,
            redirect_uri: config.google_redirect_uri.clone(),
        })
    }
}

/// Google API client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    credentials: GoogleCredentials,
    token_url: String,
    revoke_url: String,
    calendar_base_url: String,
}

impl GoogleClient {
    /// Create a new Google client with OAuth credentials.
    pub fn new(credentials: GoogleCredentials, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            token_url: TOKEN_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
            calendar_base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Send token and calendar requests to `base_url` instead of Google.
    ///
    /// Paths are `/token`, `/revoke` and `/calendar/v3/...`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.token_url = format!("{}/token", base);
        self.revoke_url = format!("{}/revoke", base);
        self.calendar_base_url = format!("{}/calendar/v3", base);
        self
    }

    /// Consent screen URL carrying our signed `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&prompt=consent&include_granted_scopes=true&state={}",
            AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(CALENDAR_SCOPE),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AppError> {
        self.token_request(
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ],
            "code exchange",
        )
        .await
    }

    /// Refresh an expired access token.
    ///
    /// A rejected refresh token maps to [`AppError::IntegrationExpired`];
    /// rejected client credentials map to [`AppError::Misconfigured`].
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, AppError> {
        self.token_request(
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
            "token refresh",
        )
        .await
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        op: &'static str,
    ) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| transport_error(op, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Google {} failed", op);

            // 400 is invalid_grant. 401 is invalid_client, which no user
            // reconnect can fix.
            return Err(match status.as_u16() {
                400 => AppError::IntegrationExpired,
                401 => AppError::Misconfigured("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET"),
                _ => AppError::TransientProvider(format!("{} returned HTTP {}", op, status)),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderResponseInvalid(format!("{}: {}", op, e)))?;

        Ok(TokenGrant {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expiry_from_now(Utc::now(), token.expires_in),
        })
    }

    /// List every calendar on the account, following `nextPageToken`.
    pub async fn list_calendars(
        &self,
        access_token: &str,
    ) -> Result<Vec<GoogleCalendarEntry>, AppError> {
        let url = format!("{}/users/me/calendarList", self.calendar_base_url);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_CALENDAR_PAGES {
            let mut request = self.http.get(&url).bearer_auth(access_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::ProviderUnavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, body = %body, "Google calendarList failed");
                return Err(AppError::ProviderUnavailable(format!(
                    "calendarList returned HTTP {}",
                    status
                )));
            }

            let page: CalendarListResponse = response
                .json()
                .await
                .map_err(|e| AppError::ProviderResponseInvalid(format!("calendarList: {}", e)))?;

            entries.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(entries),
            }
        }

        tracing::warn!(
            pages = MAX_CALENDAR_PAGES,
            "calendarList pagination truncated"
        );
        Ok(entries)
    }

    /// Revoke a token so the app disappears from the user's Google account.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(&self.revoke_url)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| transport_error("revoke", e))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "revoke returned HTTP {}",
                response.status()
            )));
        }

        tracing::info!("Google token revoked");
        Ok(())
    }
}

fn transport_error(op: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::TransientProvider(format!("{} timed out", op))
    } else {
        AppError::TransientProvider(format!("{} request failed: {}", op, err))
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Tokens issued by Google, with the expiry made absolute.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present on first consent (or with `prompt=consent`).
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEntry>,
    next_page_token: Option<String>,
}

/// One entry of Google's calendarList.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEntry {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub summary_override: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub access_role: String,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GoogleCalendarEntry {
    /// Name the user sees in Google Calendar.
    pub fn display_name(&self) -> &str {
        self.summary_override
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or(&self.id)
    }
}
