// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Production talks to the managed Postgres through PostgREST
//! ([`SupabaseDb`]); tests and local runs use [`MemoryDb`].

pub mod memory;
pub mod supabase;

pub use memory::MemoryDb;
pub use supabase::SupabaseDb;

use crate::error::AppError;
use crate::models::{CalendarFeed, OAuthIntegration, Provider, SyncApproach, TeacherProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Table names as constants.
pub mod tables {
    pub const OAUTH_INTEGRATIONS: &str = "oauth_calendar_integrations";
    pub const CALENDAR_FEEDS: &str = "calendar_feeds";
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
}

/// Shared handle used throughout the services.
pub type SharedDb = Arc<dyn Database>;

/// Storage operations.
///
/// Every feed mutation takes the owner id and matches on it, so another
/// user's feed looks exactly like a missing one.
#[async_trait]
pub trait Database: Send + Sync {
    // ─── OAuth integrations ──────────────────────────────────────

    async fn get_integration(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<OAuthIntegration>, AppError>;

    /// Insert or replace the integration for `(user_id, provider)`.
    async fn upsert_integration(&self, integration: &OAuthIntegration) -> Result<(), AppError>;

    async fn update_integration_tokens(
        &self,
        integration_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Returns false when there was nothing to delete.
    async fn delete_integration(&self, user_id: Uuid, provider: Provider)
        -> Result<bool, AppError>;

    // ─── Calendar feeds ──────────────────────────────────────────

    async fn insert_feed(&self, feed: &CalendarFeed) -> Result<CalendarFeed, AppError>;

    async fn get_feed_for_owner(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<CalendarFeed>, AppError>;

    /// All feeds of a user, newest first.
    async fn list_feeds(&self, owner_id: Uuid) -> Result<Vec<CalendarFeed>, AppError>;

    async fn latest_feed(&self, owner_id: Uuid) -> Result<Option<CalendarFeed>, AppError>;

    async fn delete_feed(&self, feed_id: Uuid, owner_id: Uuid) -> Result<bool, AppError>;

    async fn update_feed_sync_approach(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
        approach: SyncApproach,
    ) -> Result<Option<CalendarFeed>, AppError>;

    async fn mark_feed_synced(
        &self,
        feed_id: Uuid,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    // ─── Featured teacher ────────────────────────────────────────

    async fn clear_featured_flags(&self) -> Result<(), AppError>;

    /// Users with both `public_url` and `name` set.
    async fn list_featured_candidates(&self) -> Result<Vec<TeacherProfile>, AppError>;

    /// Public events of `user_id` starting at or after `now`.
    async fn count_upcoming_public_events(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    async fn set_featured(&self, user_id: Uuid) -> Result<(), AppError>;

    async fn get_featured_teacher(&self) -> Result<Option<TeacherProfile>, AppError>;
}
