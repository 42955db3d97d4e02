// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - OAuth integrations (provider tokens)
//! - Calendar feeds (owner-scoped)
//! - Users and events (featured-teacher selection)
//!
//! All calls use the service-role key, so owner scoping is enforced here by
//! always filtering on `user_id`.

use crate::db::{tables, Database};
use crate::error::AppError;
use crate::models::{
    CalendarFeed, CalendarFeedRow, OAuthIntegration, Provider, SyncApproach, TeacherProfile,
};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id,name,public_url,is_featured";

/// PostgREST database client.
#[derive(Clone)]
pub struct SupabaseDb {
    http: reqwest::Client,
    rest_url: String,
    service_key: String,
}

impl SupabaseDb {
    /// Create a new client for `{supabase_url}/rest/v1`.
    pub fn new(supabase_url: &str, service_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        let rest_url = format!("{}/rest/v1", supabase_url.trim_end_matches('/'));
        tracing::info!(url = %rest_url, "Configured PostgREST client");

        Ok(Self {
            http,
            rest_url,
            service_key: service_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", self.service_key.as_str())
            .bearer_auth(&self.service_key)
    }

    /// Send a request and map any non-2xx answer to a database error.
    async fn send(&self, request: RequestBuilder, op: &'static str) -> Result<Response, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Database(format!("{}: request failed: {}", op, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Database(format!("{}: HTTP {}: {}", op, status, body)))
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        op: &'static str,
    ) -> Result<Vec<T>, AppError> {
        self.send(request, op)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Database(format!("{}: invalid JSON: {}", op, e)))
    }

    async fn fetch_feeds(
        &self,
        request: RequestBuilder,
        op: &'static str,
    ) -> Result<Vec<CalendarFeed>, AppError> {
        let rows: Vec<CalendarFeedRow> = self.fetch_rows(request, op).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match CalendarFeed::try_from(row) {
                Ok(feed) => Some(feed),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed calendar feed row");
                    None
                }
            })
            .collect())
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Extract the total from a `Content-Range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

#[async_trait]
impl Database for SupabaseDb {
    // ─── OAuth integrations ──────────────────────────────────────

    async fn get_integration(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<OAuthIntegration>, AppError> {
        let request = self
            .request(Method::GET, tables::OAUTH_INTEGRATIONS)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("provider", eq(provider)),
                ("limit", "1".to_string()),
            ]);

        let rows: Vec<OAuthIntegration> = self.fetch_rows(request, "get_integration").await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_integration(&self, integration: &OAuthIntegration) -> Result<(), AppError> {
        let request = self
            .request(Method::POST, tables::OAUTH_INTEGRATIONS)
            .query(&[("on_conflict", "user_id,provider")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(integration);

        self.send(request, "upsert_integration").await?;
        Ok(())
    }

    async fn update_integration_tokens(
        &self,
        integration_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let request = self
            .request(Method::PATCH, tables::OAUTH_INTEGRATIONS)
            .query(&[("id", eq(integration_id))])
            .json(&json!({
                "access_token": access_token,
                "expires_at": expires_at,
                "updated_at": Utc::now(),
            }));

        self.send(request, "update_integration_tokens").await?;
        Ok(())
    }

    async fn delete_integration(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<bool, AppError> {
        let request = self
            .request(Method::DELETE, tables::OAUTH_INTEGRATIONS)
            .query(&[("user_id", eq(user_id)), ("provider", eq(provider))])
            .header("Prefer", "return=representation");

        let deleted: Vec<serde_json::Value> =
            self.fetch_rows(request, "delete_integration").await?;
        Ok(!deleted.is_empty())
    }

    // ─── Calendar feeds ──────────────────────────────────────────

    async fn insert_feed(&self, feed: &CalendarFeed) -> Result<CalendarFeed, AppError> {
        let request = self
            .request(Method::POST, tables::CALENDAR_FEEDS)
            .header("Prefer", "return=representation")
            .json(feed);

        self.fetch_feeds(request, "insert_feed")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("insert_feed: no row returned".to_string()))
    }

    async fn get_feed_for_owner(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<CalendarFeed>, AppError> {
        let request = self.request(Method::GET, tables::CALENDAR_FEEDS).query(&[
            ("select", "*".to_string()),
            ("id", eq(feed_id)),
            ("user_id", eq(owner_id)),
        ]);

        Ok(self
            .fetch_feeds(request, "get_feed_for_owner")
            .await?
            .into_iter()
            .next())
    }

    async fn list_feeds(&self, owner_id: Uuid) -> Result<Vec<CalendarFeed>, AppError> {
        let request = self.request(Method::GET, tables::CALENDAR_FEEDS).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(owner_id)),
            ("order", "created_at.desc".to_string()),
        ]);

        self.fetch_feeds(request, "list_feeds").await
    }

    async fn latest_feed(&self, owner_id: Uuid) -> Result<Option<CalendarFeed>, AppError> {
        let request = self.request(Method::GET, tables::CALENDAR_FEEDS).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(owner_id)),
            ("order", "created_at.desc".to_string()),
            ("limit", "1".to_string()),
        ]);

        Ok(self
            .fetch_feeds(request, "latest_feed")
            .await?
            .into_iter()
            .next())
    }

    async fn delete_feed(&self, feed_id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let request = self
            .request(Method::DELETE, tables::CALENDAR_FEEDS)
            .query(&[("id", eq(feed_id)), ("user_id", eq(owner_id))])
            .header("Prefer", "return=representation");

        let deleted: Vec<serde_json::Value> = self.fetch_rows(request, "delete_feed").await?;
        Ok(!deleted.is_empty())
    }

    async fn update_feed_sync_approach(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
        approach: SyncApproach,
    ) -> Result<Option<CalendarFeed>, AppError> {
        let request = self
            .request(Method::PATCH, tables::CALENDAR_FEEDS)
            .query(&[("id", eq(feed_id)), ("user_id", eq(owner_id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "sync_approach": approach }));

        Ok(self
            .fetch_feeds(request, "update_feed_sync_approach")
            .await?
            .into_iter()
            .next())
    }

    async fn mark_feed_synced(
        &self,
        feed_id: Uuid,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let request = self
            .request(Method::PATCH, tables::CALENDAR_FEEDS)
            .query(&[("id", eq(feed_id))])
            .json(&json!({ "last_synced_at": synced_at }));

        self.send(request, "mark_feed_synced").await?;
        Ok(())
    }

    // ─── Featured teacher ────────────────────────────────────────

    async fn clear_featured_flags(&self) -> Result<(), AppError> {
        // PostgREST refuses unfiltered updates; only flagged rows need touching.
        let request = self
            .request(Method::PATCH, tables::USERS)
            .query(&[("is_featured", "eq.true")])
            .json(&json!({ "is_featured": false }));

        self.send(request, "clear_featured_flags").await?;
        Ok(())
    }

    async fn list_featured_candidates(&self) -> Result<Vec<TeacherProfile>, AppError> {
        let request = self.request(Method::GET, tables::USERS).query(&[
            ("select", PROFILE_COLUMNS),
            ("public_url", "not.is.null"),
            ("name", "not.is.null"),
        ]);

        self.fetch_rows(request, "list_featured_candidates").await
    }

    async fn count_upcoming_public_events(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let request = self
            .request(Method::HEAD, tables::EVENTS)
            .query(&[
                ("select", "id".to_string()),
                ("user_id", eq(user_id)),
                ("visibility", "eq.public".to_string()),
                ("start_time", format!("gte.{}", format_utc_rfc3339(now))),
            ])
            .header("Prefer", "count=exact");

        let response = self.send(request, "count_upcoming_public_events").await?;

        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                AppError::Database("count_upcoming_public_events: missing Content-Range".to_string())
            })
    }

    async fn set_featured(&self, user_id: Uuid) -> Result<(), AppError> {
        let request = self
            .request(Method::PATCH, tables::USERS)
            .query(&[("id", eq(user_id))])
            .json(&json!({ "is_featured": true }));

        self.send(request, "set_featured").await?;
        Ok(())
    }

    async fn get_featured_teacher(&self) -> Result<Option<TeacherProfile>, AppError> {
        let request = self.request(Method::GET, tables::USERS).query(&[
            ("select", PROFILE_COLUMNS),
            ("is_featured", "eq.true"),
            ("limit", "1"),
        ]);

        let rows: Vec<TeacherProfile> = self.fetch_rows(request, "get_featured_teacher").await?;
        Ok(rows.into_iter().next())
    }
}
