// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendars;
pub mod featured;
pub mod feeds;
pub mod functions;
pub mod google;
pub mod sync;
pub mod token;

pub use calendars::{CalendarListing, CalendarService};
pub use featured::{
    FeaturedTeacher, FeaturedTeacherSelector, RemoteFeaturedSelector, SelectionMethod,
    SelectionReport,
};
pub use feeds::{CreatedFeed, FeedRegistry};
pub use functions::EdgeFunctions;
pub use google::{GoogleClient, GoogleCredentials, TokenGrant};
pub use sync::{FeedSyncer, RemoteSyncOutcome, SyncOrchestrator};
pub use token::{IntegrationTokenPersister, TokenPersister, TokenRefresher};
