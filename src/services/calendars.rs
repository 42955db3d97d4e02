// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar integration: connecting, listing calendars, disconnecting.

use crate::db::SharedDb;
use crate::error::AppError;
use crate::models::{CalendarFeed, CalendarItem, OAuthIntegration, Provider};
use crate::services::google::{GoogleCalendarEntry, GoogleClient, TokenGrant};
use crate::services::token::{IntegrationTokenPersister, TokenRefresher};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Calendar picker contents. `error` is set instead of failing the request.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarListing {
    pub calendars: Vec<CalendarItem>,
    pub error: Option<String>,
}

/// Google Calendar operations for one deployment.
#[derive(Clone)]
pub struct CalendarService {
    db: SharedDb,
    google: GoogleClient,
    refresher: TokenRefresher,
}

impl CalendarService {
    pub fn new(db: SharedDb, google: GoogleClient) -> Self {
        let refresher = TokenRefresher::new(google.clone());
        Self {
            db,
            google,
            refresher,
        }
    }

    pub fn google(&self) -> &GoogleClient {
        &self.google
    }

    /// Store the tokens from a completed authorization.
    ///
    /// Reconnecting keeps the integration id. Google only sends a refresh
    /// token on some consents, so the stored one is kept when it is absent.
    pub async fn connect(&self, user_id: Uuid, grant: TokenGrant) -> Result<(), AppError> {
        let existing = self.db.get_integration(user_id, Provider::Google).await?;

        let refresh_token = match (grant.refresh_token, &existing) {
            (Some(token), _) => token,
            (None, Some(previous)) => previous.refresh_token.clone(),
            (None, None) => {
                return Err(AppError::ProviderResponseInvalid(
                    "no refresh token issued".to_string(),
                ))
            }
        };

        let integration = match existing {
            Some(previous) => OAuthIntegration {
                access_token: grant.access_token,
                refresh_token,
                expires_at: grant.expires_at,
                updated_at: Utc::now(),
                ..previous
            },
            None => OAuthIntegration::new(
                user_id,
                Provider::Google,
                grant.access_token,
                refresh_token,
                grant.expires_at,
            ),
        };

        self.db.upsert_integration(&integration).await?;
        tracing::info!(user_id = %user_id, "Google Calendar connected");
        Ok(())
    }

    /// Revoke at Google (best effort) and delete the integration.
    pub async fn disconnect(&self, user_id: Uuid) -> Result<(), AppError> {
        let integration = self
            .db
            .get_integration(user_id, Provider::Google)
            .await?
            .ok_or_else(not_connected)?;

        if let Err(e) = self.google.revoke_token(&integration.refresh_token).await {
            tracing::warn!(user_id = %user_id, error = %e, "Token revocation failed, deleting anyway");
        }

        if !self.db.delete_integration(user_id, Provider::Google).await? {
            return Err(not_connected());
        }

        tracing::info!(user_id = %user_id, "Google Calendar disconnected");
        Ok(())
    }

    /// A valid access token for the user's Google integration, refreshed
    /// and saved if needed.
    pub async fn valid_access_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let integration = self
            .db
            .get_integration(user_id, Provider::Google)
            .await?
            .ok_or_else(not_connected)?;

        let persister = IntegrationTokenPersister::new(self.db.clone(), integration.id);
        self.refresher
            .get_valid_access_token(&integration, &persister)
            .await
    }

    /// List the user's Google calendars. Never fails.
    pub async fn list_calendars(&self, user_id: Uuid) -> CalendarListing {
        match self.try_list_calendars(user_id).await {
            Ok(calendars) => CalendarListing {
                calendars,
                error: None,
            },
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Listing calendars failed");
                CalendarListing {
                    calendars: Vec::new(),
                    error: Some(e.public_message()),
                }
            }
        }
    }

    async fn try_list_calendars(&self, user_id: Uuid) -> Result<Vec<CalendarItem>, AppError> {
        let access_token = self.valid_access_token(user_id).await?;
        let entries = self.google.list_calendars(&access_token).await?;
        let feeds = self.db.list_feeds(user_id).await?;

        Ok(mark_selected(entries, &feeds))
    }
}

fn not_connected() -> AppError {
    AppError::NotFound("Google Calendar is not connected".to_string())
}

/// Convert provider entries, flagging those some feed already references.
pub fn mark_selected(entries: Vec<GoogleCalendarEntry>, feeds: &[CalendarFeed]) -> Vec<CalendarItem> {
    let selected: HashSet<&str> = feeds
        .iter()
        .filter_map(|f| f.calendar_ref())
        .filter(|c| c.provider == Provider::Google)
        .map(|c| c.calendar_id.as_str())
        .collect();

    entries
        .into_iter()
        .map(|entry| CalendarItem {
            selected: selected.contains(entry.id.as_str()),
            summary: entry.display_name().to_string(),
            id: entry.id,
            primary: entry.primary,
            access_role: entry.access_role,
            background_color: entry.background_color,
            description: entry.description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarRef, FeedSource, SyncApproach};

    fn entry(id: &str) -> GoogleCalendarEntry {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "summary": format!("Calendar {}", id),
            "accessRole": "owner"
        }))
        .unwrap()
    }

    #[test]
    fn test_mark_selected_matches_calendar_id() {
        let owner = Uuid::new_v4();
        let feeds = vec![
            CalendarFeed::new(
                owner,
                FeedSource::Provider(CalendarRef::new(Provider::Google, "b@group", "B: studio")),
                SyncApproach::YogaOnly,
            ),
            CalendarFeed::new(
                owner,
                FeedSource::Ics {
                    url: "https://example.com/a@group".to_string(),
                    name: Some("a@group".to_string()),
                },
                SyncApproach::YogaOnly,
            ),
        ];

        let items = mark_selected(vec![entry("a@group"), entry("b@group")], &feeds);

        assert_eq!(items.len(), 2);
        assert!(!items[0].selected);
        assert!(items[1].selected);
        assert_eq!(items[1].summary, "Calendar b@group");
        assert_eq!(items[1].access_role, "owner");
    }
}
