// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token management for calendar integrations.
//!
//! The refresher decides whether the stored token is still usable and, if
//! not, refreshes it with Google. Writing the new token back is delegated
//! to a [`TokenPersister`] supplied by the caller; the refresher never
//! touches storage itself.

use crate::db::SharedDb;
use crate::error::AppError;
use crate::models::OAuthIntegration;
use crate::services::google::GoogleClient;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Refresh tokens that expire within this many seconds.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Receives a freshly issued access token.
#[async_trait]
pub trait TokenPersister: Send + Sync {
    async fn persist(&self, access_token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;
}

/// Writes refreshed tokens onto one integration row.
pub struct IntegrationTokenPersister {
    db: SharedDb,
    integration_id: Uuid,
}

impl IntegrationTokenPersister {
    pub fn new(db: SharedDb, integration_id: Uuid) -> Self {
        Self { db, integration_id }
    }
}

#[async_trait]
impl TokenPersister for IntegrationTokenPersister {
    async fn persist(&self, access_token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        self.db
            .update_integration_tokens(self.integration_id, access_token, expires_at)
            .await
    }
}

/// Hands out access tokens that are valid for at least the refresh margin.
#[derive(Clone)]
pub struct TokenRefresher {
    google: GoogleClient,
    margin: Duration,
}

impl TokenRefresher {
    pub fn new(google: GoogleClient) -> Self {
        Self {
            google,
            margin: Duration::seconds(TOKEN_REFRESH_MARGIN_SECS),
        }
    }

    /// Return a usable access token for `integration`.
    ///
    /// A token that is still valid is returned as-is and `persister` is not
    /// called. Otherwise the refresh token is exchanged exactly once and the
    /// result is handed to `persister` before returning.
    ///
    /// Concurrent callers may both refresh; no lock is taken.
    pub async fn get_valid_access_token(
        &self,
        integration: &OAuthIntegration,
        persister: &dyn TokenPersister,
    ) -> Result<String, AppError> {
        if !integration.expires_within(Utc::now(), self.margin) {
            return Ok(integration.access_token.clone());
        }

        tracing::info!(
            integration_id = %integration.id,
            user_id = %integration.user_id,
            "Access token expired, refreshing"
        );

        let grant = self
            .google
            .refresh_access_token(&integration.refresh_token)
            .await?;

        // The new token works whether or not it was saved; the next request
        // just refreshes again.
        if let Err(e) = persister.persist(&grant.access_token, grant.expires_at).await {
            tracing::warn!(
                integration_id = %integration.id,
                error = %e,
                "Failed to persist refreshed access token"
            );
        }

        Ok(grant.access_token)
    }
}
