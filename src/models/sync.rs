// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed synchronization results.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Time range handed to the remote sync function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// Window from `now` covering the next `days` days.
    pub fn upcoming(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now,
            end: now + Duration::days(days),
        }
    }
}

/// Outcome of syncing one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub feed_id: Uuid,
    pub success: bool,
    /// Number of events ingested (0 on failure).
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(feed_id: Uuid, count: u32) -> Self {
        Self {
            feed_id,
            success: true,
            count,
            error: None,
        }
    }

    pub fn failed(feed_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            feed_id,
            success: false,
            count: 0,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of syncing every feed a user owns.
///
/// Partial failure is a normal outcome; callers inspect the counts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub successful_syncs: u32,
    pub total_feeds: u32,
    pub total_events: u32,
    pub results: Vec<SyncResult>,
}

impl SyncSummary {
    pub fn from_results(results: Vec<SyncResult>) -> Self {
        let successful: Vec<&SyncResult> = results.iter().filter(|r| r.success).collect();

        // Counts saturate at u32::MAX
        Self {
            successful_syncs: saturating_len(successful.len()),
            total_feeds: saturating_len(results.len()),
            total_events: successful
                .iter()
                .fold(0u32, |total, r| total.saturating_add(r.count)),
            results,
        }
    }

    pub fn failed_syncs(&self) -> u32 {
        self.total_feeds.saturating_sub(self.successful_syncs)
    }
}

fn saturating_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
