// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teacher profile and event fields used by featured-teacher selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile columns of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub public_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl TeacherProfile {
    /// Has the public profile fields required to be featured.
    pub fn has_public_profile(&self) -> bool {
        self.public_url.is_some() && self.name.is_some()
    }
}

/// Event visibility on the public schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// The `events` columns this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub visibility: Visibility,
}

impl ScheduledEvent {
    pub fn is_upcoming_public(&self, now: DateTime<Utc>) -> bool {
        self.visibility == Visibility::Public && self.start_time >= now
    }
}
