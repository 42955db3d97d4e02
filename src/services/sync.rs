// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed synchronization orchestration.
//!
//! Parsing calendars and upserting events happens in a remote function
//! ([`FeedSyncer`]). The remote side must upsert events by their external
//! UID: this layer does not deduplicate and may invoke the same feed twice.
//!
//! Every failure is turned into a failed [`SyncResult`] for that feed, so a
//! broken feed never aborts the others.

use crate::db::SharedDb;
use crate::error::AppError;
use crate::models::{SyncResult, SyncSummary, SyncWindow};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Days ahead covered by every sync.
pub const SYNC_WINDOW_DAYS: i64 = 90;

/// Upper bound on feed syncs in flight for one user.
pub const MAX_CONCURRENT_FEED_SYNCS: usize = 16;

/// What the remote sync function reports for one feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSyncOutcome {
    pub success: bool,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote capability that imports a feed's events for a time window.
#[async_trait]
pub trait FeedSyncer: Send + Sync {
    async fn sync_feed(
        &self,
        feed_id: Uuid,
        window: SyncWindow,
    ) -> Result<RemoteSyncOutcome, AppError>;
}

/// Runs feed syncs and records their bookkeeping.
pub struct SyncOrchestrator {
    db: SharedDb,
    syncer: Arc<dyn FeedSyncer>,
}

impl SyncOrchestrator {
    pub fn new(db: SharedDb, syncer: Arc<dyn FeedSyncer>) -> Self {
        Self { db, syncer }
    }

    /// Sync one feed. Never fails; errors come back inside the result.
    pub async fn sync_one_feed(&self, feed_id: Uuid) -> SyncResult {
        let window = SyncWindow::upcoming(Utc::now(), SYNC_WINDOW_DAYS);

        match self.syncer.sync_feed(feed_id, window).await {
            Ok(outcome) if outcome.success => {
                if let Err(e) = self.db.mark_feed_synced(feed_id, Utc::now()).await {
                    tracing::warn!(feed_id = %feed_id, error = %e, "Failed to record last sync time");
                }
                tracing::info!(feed_id = %feed_id, count = outcome.count, "Feed synced");
                SyncResult::succeeded(feed_id, outcome.count)
            }
            Ok(outcome) => {
                let error = outcome
                    .error
                    .unwrap_or_else(|| "Sync function reported failure".to_string());
                tracing::warn!(feed_id = %feed_id, error = %error, "Feed sync failed");
                SyncResult::failed(feed_id, error)
            }
            Err(e) => {
                tracing::warn!(feed_id = %feed_id, error = %e, "Feed sync call failed");
                SyncResult::failed(feed_id, e.public_message())
            }
        }
    }

    /// Sync the caller's most recently created feed.
    pub async fn sync_latest_feed(&self, user_id: Uuid) -> Result<SyncResult, AppError> {
        let feed = self
            .db
            .latest_feed(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No calendar feed found".to_string()))?;

        Ok(self.sync_one_feed(feed.id).await)
    }

    /// Sync every feed the user owns, concurrently.
    ///
    /// Only listing the feeds can fail; per-feed failures are counted in
    /// the summary.
    pub async fn sync_all_feeds_for_user(&self, user_id: Uuid) -> Result<SyncSummary, AppError> {
        let feeds = self.db.list_feeds(user_id).await?;

        let results: Vec<SyncResult> = stream::iter(feeds.into_iter().map(|feed| feed.id))
            .map(|feed_id| self.sync_one_feed(feed_id))
            .buffer_unordered(MAX_CONCURRENT_FEED_SYNCS)
            .collect()
            .await;

        let summary = SyncSummary::from_results(results);
        tracing::info!(
            user_id = %user_id,
            total = summary.total_feeds,
            successful = summary.successful_syncs,
            events = summary.total_events,
            "Synced all feeds"
        );

        Ok(summary)
    }
}
