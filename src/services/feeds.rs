// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar feed registry.
//!
//! Every operation takes the owner id. A feed owned by someone else is
//! reported exactly like a missing one.

use crate::db::SharedDb;
use crate::error::AppError;
use crate::models::{CalendarFeed, CalendarRef, FeedSource, Provider, SyncApproach, SyncResult};
use crate::services::sync::SyncOrchestrator;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// A feed that was just created, with the outcome of its first sync.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFeed {
    pub feed: CalendarFeed,
    /// Set for ICS feeds, which are synced right away.
    pub sync_result: Option<SyncResult>,
}

pub struct FeedRegistry {
    db: SharedDb,
    sync: Arc<SyncOrchestrator>,
}

fn feed_not_found() -> AppError {
    AppError::NotFound("Calendar feed not found".to_string())
}

impl FeedRegistry {
    pub fn new(db: SharedDb, sync: Arc<SyncOrchestrator>) -> Self {
        Self { db, sync }
    }

    /// Create a feed. ICS feeds are synced immediately.
    ///
    /// A failed first sync does not undo the creation; the feed stays with
    /// no `last_synced_at` and can be synced again later.
    pub async fn create_feed(
        &self,
        owner_id: Uuid,
        source: FeedSource,
        sync_approach: SyncApproach,
    ) -> Result<CreatedFeed, AppError> {
        let feed = self
            .db
            .insert_feed(&CalendarFeed::new(owner_id, source, sync_approach))
            .await?;
        tracing::info!(user_id = %owner_id, feed_id = %feed.id, ics = feed.is_ics(), "Created calendar feed");

        if !feed.is_ics() {
            return Ok(CreatedFeed {
                feed,
                sync_result: None,
            });
        }

        let result = self.sync.sync_one_feed(feed.id).await;
        let feed = if result.success {
            self.reload_synced_feed(feed, owner_id).await
        } else {
            feed
        };

        Ok(CreatedFeed {
            feed,
            sync_result: Some(result),
        })
    }

    /// Re-read a feed after its first sync. The feed is already stored, so a
    /// failed read falls back to the local copy instead of failing creation.
    async fn reload_synced_feed(&self, mut feed: CalendarFeed, owner_id: Uuid) -> CalendarFeed {
        match self.db.get_feed_for_owner(feed.id, owner_id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => feed,
            Err(e) => {
                tracing::warn!(feed_id = %feed.id, error = %e, "Failed to reload synced feed");
                feed.last_synced_at = Some(Utc::now());
                feed
            }
        }
    }

    /// Create provider feeds for the given calendars.
    ///
    /// Calendars that already have a feed are skipped; the returned list
    /// holds only the new feeds.
    pub async fn select_calendars(
        &self,
        owner_id: Uuid,
        calendars: Vec<CalendarRef>,
        sync_approach: SyncApproach,
    ) -> Result<Vec<CalendarFeed>, AppError> {
        let existing = self.db.list_feeds(owner_id).await?;
        let mut selected: HashSet<(Provider, String)> = existing
            .iter()
            .filter_map(|f| f.calendar_ref())
            .map(|c| (c.provider, c.calendar_id.clone()))
            .collect();

        let mut created = Vec::new();
        for calendar in calendars {
            if !selected.insert((calendar.provider, calendar.calendar_id.clone())) {
                tracing::debug!(calendar_id = %calendar.calendar_id, "Calendar already selected");
                continue;
            }

            let feed = self
                .db
                .insert_feed(&CalendarFeed::new(
                    owner_id,
                    FeedSource::Provider(calendar),
                    sync_approach,
                ))
                .await?;
            created.push(feed);
        }

        tracing::info!(user_id = %owner_id, created = created.len(), "Selected provider calendars");
        Ok(created)
    }

    pub async fn list_feeds(&self, owner_id: Uuid) -> Result<Vec<CalendarFeed>, AppError> {
        self.db.list_feeds(owner_id).await
    }

    /// The most recently created feed of `owner_id`.
    pub async fn latest_feed(&self, owner_id: Uuid) -> Result<CalendarFeed, AppError> {
        self.db
            .latest_feed(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No calendar feed found".to_string()))
    }

    pub async fn delete_feed(&self, owner_id: Uuid, feed_id: Uuid) -> Result<(), AppError> {
        if !self.db.delete_feed(feed_id, owner_id).await? {
            return Err(feed_not_found());
        }
        tracing::info!(user_id = %owner_id, feed_id = %feed_id, "Deleted calendar feed");
        Ok(())
    }

    /// Change how a feed's events are filtered.
    ///
    /// The value is validated before anything is written.
    pub async fn update_sync_approach(
        &self,
        owner_id: Uuid,
        feed_id: Uuid,
        approach: &str,
    ) -> Result<CalendarFeed, AppError> {
        let approach: SyncApproach = approach.parse()?;

        self.db
            .update_feed_sync_approach(feed_id, owner_id, approach)
            .await?
            .ok_or_else(feed_not_found)
    }
}
