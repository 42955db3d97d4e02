// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod calendar;
pub mod feed;
pub mod integration;
pub mod sync;
pub mod teacher;

pub use calendar::CalendarItem;
pub use feed::{CalendarFeed, CalendarFeedRow, CalendarRef, FeedSource, SyncApproach};
pub use integration::{OAuthIntegration, Provider};
pub use sync::{SyncResult, SyncSummary, SyncWindow};
pub use teacher::{ScheduledEvent, TeacherProfile, Visibility};
