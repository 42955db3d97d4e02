// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar feed model.
//!
//! The `calendar_feeds` table stores provider-backed feeds with a packed
//! `calendar_name` of the form `oauth:<provider>:<calendar_id>:<display_name>`.
//! That encoding only exists in [`CalendarFeedRow`]; everything else works
//! with the typed [`FeedSource`].

use crate::error::AppError;
use crate::models::integration::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const OAUTH_PREFIX: &str = "oauth";

/// How events from a feed are filtered into the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncApproach {
    /// Every event in the calendar is a class.
    #[default]
    YogaOnly,
    /// Calendar mixes classes with other events; filter on import.
    MixedCalendar,
}

impl SyncApproach {
    pub const ALL: [SyncApproach; 2] = [SyncApproach::YogaOnly, SyncApproach::MixedCalendar];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncApproach::YogaOnly => "yoga_only",
            SyncApproach::MixedCalendar => "mixed_calendar",
        }
    }
}

impl fmt::Display for SyncApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncApproach {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncApproach::ALL
            .into_iter()
            .find(|approach| approach.as_str() == s)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid sync approach '{}': expected 'yoga_only' or 'mixed_calendar'",
                    s
                ))
            })
    }
}

/// Reference to a calendar on a provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRef {
    pub provider: Provider,
    pub calendar_id: String,
    pub display_name: String,
}

impl CalendarRef {
    pub fn new(provider: Provider, calendar_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            provider,
            calendar_id: calendar_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Parse the packed `oauth:<provider>:<calendar_id>:<display_name>` form.
    ///
    /// The display name may itself contain colons.
    pub fn parse(packed: &str) -> Option<Self> {
        let mut parts = packed.splitn(4, ':');
        if parts.next()? != OAUTH_PREFIX {
            return None;
        }
        let provider = parts.next()?.parse().ok()?;
        let calendar_id = parts.next()?;
        if calendar_id.is_empty() {
            return None;
        }
        let display_name = parts.next().unwrap_or_default();

        Some(Self::new(provider, calendar_id, display_name))
    }
}

impl fmt::Display for CalendarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            OAUTH_PREFIX, self.provider, self.calendar_id, self.display_name
        )
    }
}

/// Where a feed's events come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Public ICS URL, with an optional label chosen by the user.
    Ics { url: String, name: Option<String> },
    /// Calendar on a connected provider account.
    Provider(CalendarRef),
}

/// A user's calendar feed.
///
/// Serializes as its `calendar_feeds` row, in storage and in API responses
/// alike, so clients see the same snake_case fields they would read from the
/// table. Only the response envelopes around it are camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CalendarFeedRow", into = "CalendarFeedRow")]
pub struct CalendarFeed {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source: FeedSource,
    pub sync_approach: SyncApproach,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CalendarFeed {
    pub fn new(user_id: Uuid, source: FeedSource, sync_approach: SyncApproach) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source,
            sync_approach,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_ics(&self) -> bool {
        matches!(self.source, FeedSource::Ics { .. })
    }

    pub fn calendar_ref(&self) -> Option<&CalendarRef> {
        match &self.source {
            FeedSource::Provider(calendar) => Some(calendar),
            FeedSource::Ics { .. } => None,
        }
    }
}

/// Storage and API shape of a `calendar_feeds` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarFeedRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feed_url: Option<String>,
    pub calendar_name: Option<String>,
    pub sync_approach: SyncApproach,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A row that is neither an ICS feed nor a well-formed provider reference.
#[derive(Debug, thiserror::Error)]
#[error("calendar feed {0} has neither a feed_url nor a valid calendar reference")]
pub struct MalformedFeedRow(pub Uuid);

impl TryFrom<CalendarFeedRow> for CalendarFeed {
    type Error = MalformedFeedRow;

    fn try_from(row: CalendarFeedRow) -> Result<Self, Self::Error> {
        let source = match (row.feed_url, row.calendar_name) {
            (Some(url), name) => FeedSource::Ics { url, name },
            (None, Some(packed)) => {
                FeedSource::Provider(CalendarRef::parse(&packed).ok_or(MalformedFeedRow(row.id))?)
            }
            (None, None) => return Err(MalformedFeedRow(row.id)),
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            source,
            sync_approach: row.sync_approach,
            last_synced_at: row.last_synced_at,
            created_at: row.created_at,
        })
    }
}

impl From<CalendarFeed> for CalendarFeedRow {
    fn from(feed: CalendarFeed) -> Self {
        let (feed_url, calendar_name) = match feed.source {
            FeedSource::Ics { url, name } => (Some(url), name),
            FeedSource::Provider(calendar) => (None, Some(calendar.to_string())),
        };

        Self {
            id: feed.id,
            user_id: feed.user_id,
            feed_url,
            calendar_name,
            sync_approach: feed.sync_approach,
            last_synced_at: feed.last_synced_at,
            created_at: feed.created_at,
        }
    }
}
