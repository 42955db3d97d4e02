// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! avara: schedule publishing backend for yoga teachers
//!
//! This crate provides the calendar side of the API: connecting Google
//! Calendar over OAuth, managing calendar feeds, triggering feed syncs and
//! picking the featured teacher shown on the landing page.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SharedDb;
use error::AppError;
use services::{
    CalendarService, FeaturedTeacherSelector, FeedRegistry, FeedSyncer, GoogleClient,
    RemoteFeaturedSelector, SyncOrchestrator,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SharedDb,
    /// `None` when Google OAuth credentials are not configured.
    pub calendars: Option<CalendarService>,
    pub feeds: FeedRegistry,
    pub sync: Arc<SyncOrchestrator>,
    pub featured: FeaturedTeacherSelector,
}

impl AppState {
    /// Wire the services around a database and the remote collaborators.
    pub fn new(
        config: Config,
        db: SharedDb,
        google: Option<GoogleClient>,
        syncer: Arc<dyn FeedSyncer>,
        featured_remote: Arc<dyn RemoteFeaturedSelector>,
    ) -> Self {
        let sync = Arc::new(SyncOrchestrator::new(db.clone(), syncer));

        Self {
            calendars: google.map(|google| CalendarService::new(db.clone(), google)),
            feeds: FeedRegistry::new(db.clone(), sync.clone()),
            featured: FeaturedTeacherSelector::new(db.clone(), featured_remote),
            sync,
            db,
            config,
        }
    }

    /// The Google Calendar service, or a configuration error.
    pub fn calendars(&self) -> Result<&CalendarService, AppError> {
        self.calendars
            .as_ref()
            .ok_or(AppError::Misconfigured("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET"))
    }
}
