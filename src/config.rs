// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Google OAuth credentials are optional
//! so the rest of the API keeps working on deployments without the calendar
//! integration; the Google routes answer 500 in that case.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;

const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const OAUTH_STATE_KEY_INFO: &[u8] = b"avara-oauth-state-v1";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Public URL of the web app (`NEXT_PUBLIC_APP_URL`), used for redirects and CORS
    pub app_url: String,
    /// Server port
    pub port: u16,
    /// Google OAuth client ID
    pub google_client_id: Option<String>,
    /// Redirect URI registered with Google
    pub google_redirect_uri: String,
    /// Supabase project URL (PostgREST and edge functions live under it)
    pub supabase_url: String,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout_secs: u64,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: Option<String>,
    /// Service-role key for PostgREST and edge function calls
    pub supabase_service_role_key: String,
    /// HS256 secret that signs Supabase session JWTs (raw bytes)
    pub supabase_jwt_secret: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    /// Shared secret expected from the scheduler, if any
    pub cron_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let app_url = get("NEXT_PUBLIC_APP_URL")
            .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let google_redirect_uri = get("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|| format!("{}/api/auth/google/callback", app_url));

        let supabase_jwt_secret = require("SUPABASE_JWT_SECRET")?.into_bytes();
        let oauth_state_key = match get("OAUTH_STATE_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => derive_state_key(&supabase_jwt_secret)?,
        };

        Ok(Self {
            app_url,
            port,
            google_client_id: get("GOOGLE_CLIENT_ID"),
            google_redirect_uri,
            supabase_url: require("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            http_timeout_secs,
            google_client_secret: get("GOOGLE_CLIENT_SECRET"),
            supabase_service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            supabase_jwt_secret,
            oauth_state_key,
            cron_secret: get("CRON_SECRET"),
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            port: 8080,
            google_client_id: Some("test_client_id".to_string()),
            google_redirect_uri: "http://localhost:3000/api/auth/google/callback".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            http_timeout_secs: 5,
            google_client_secret: Some("test_client_secret".to_string()),
            supabase_service_role_key: "test_service_role_key".to_string(),
            supabase_jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            cron_secret: None,
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.app_url.starts_with("https://")
    }
}

/// Derive the OAuth state signing key from the session secret so the two
/// never share key material directly.
fn derive_state_key(master: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let hk = Hkdf::<Sha256>::new(None, master);
    let mut okm = [0u8; 32];
    hk.expand(OAUTH_STATE_KEY_INFO, &mut okm)
        .map_err(|_| ConfigError::Invalid("OAUTH_STATE_SECRET"))?;
    Ok(okm.to_vec())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
