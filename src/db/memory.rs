// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory database used by tests and local runs without Supabase.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{
    CalendarFeed, OAuthIntegration, Provider, ScheduledEvent, SyncApproach, TeacherProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Thread-safe in-memory tables.
#[derive(Default)]
pub struct MemoryDb {
    integrations: DashMap<(Uuid, Provider), OAuthIntegration>,
    feeds: DashMap<Uuid, CalendarFeed>,
    users: DashMap<Uuid, TeacherProfile>,
    events: DashMap<Uuid, ScheduledEvent>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: TeacherProfile) {
        self.users.insert(user.id, user);
    }

    pub fn insert_event(&self, event: ScheduledEvent) {
        self.events.insert(event.id, event);
    }

    pub fn user(&self, user_id: Uuid) -> Option<TeacherProfile> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    /// Ids of every user currently flagged as featured.
    pub fn featured_user_ids(&self) -> Vec<Uuid> {
        self.users
            .iter()
            .filter(|u| u.is_featured)
            .map(|u| u.id)
            .collect()
    }

    pub fn feed(&self, feed_id: Uuid) -> Option<CalendarFeed> {
        self.feeds.get(&feed_id).map(|f| f.clone())
    }
}

#[async_trait]
impl Database for MemoryDb {
    async fn get_integration(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<OAuthIntegration>, AppError> {
        Ok(self.integrations.get(&(user_id, provider)).map(|i| i.clone()))
    }

    async fn upsert_integration(&self, integration: &OAuthIntegration) -> Result<(), AppError> {
        self.integrations.insert(
            (integration.user_id, integration.provider),
            integration.clone(),
        );
        Ok(())
    }

    async fn update_integration_tokens(
        &self,
        integration_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(mut integration) = self
            .integrations
            .iter_mut()
            .find(|i| i.id == integration_id)
        {
            integration.access_token = access_token.to_string();
            integration.expires_at = expires_at;
            integration.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_integration(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<bool, AppError> {
        Ok(self.integrations.remove(&(user_id, provider)).is_some())
    }

    async fn insert_feed(&self, feed: &CalendarFeed) -> Result<CalendarFeed, AppError> {
        self.feeds.insert(feed.id, feed.clone());
        Ok(feed.clone())
    }

    async fn get_feed_for_owner(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<CalendarFeed>, AppError> {
        Ok(self
            .feeds
            .get(&feed_id)
            .filter(|f| f.user_id == owner_id)
            .map(|f| f.clone()))
    }

    async fn list_feeds(&self, owner_id: Uuid) -> Result<Vec<CalendarFeed>, AppError> {
        let mut feeds: Vec<CalendarFeed> = self
            .feeds
            .iter()
            .filter(|f| f.user_id == owner_id)
            .map(|f| f.clone())
            .collect();
        feeds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feeds)
    }

    async fn latest_feed(&self, owner_id: Uuid) -> Result<Option<CalendarFeed>, AppError> {
        Ok(self.list_feeds(owner_id).await?.into_iter().next())
    }

    async fn delete_feed(&self, feed_id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .feeds
            .remove_if(&feed_id, |_, f| f.user_id == owner_id)
            .is_some())
    }

    async fn update_feed_sync_approach(
        &self,
        feed_id: Uuid,
        owner_id: Uuid,
        approach: SyncApproach,
    ) -> Result<Option<CalendarFeed>, AppError> {
        Ok(self
            .feeds
            .get_mut(&feed_id)
            .filter(|f| f.user_id == owner_id)
            .map(|mut f| {
                f.sync_approach = approach;
                f.clone()
            }))
    }

    async fn mark_feed_synced(
        &self,
        feed_id: Uuid,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(mut feed) = self.feeds.get_mut(&feed_id) {
            feed.last_synced_at = Some(synced_at);
        }
        Ok(())
    }

    async fn clear_featured_flags(&self) -> Result<(), AppError> {
        for mut user in self.users.iter_mut() {
            user.is_featured = false;
        }
        Ok(())
    }

    async fn list_featured_candidates(&self) -> Result<Vec<TeacherProfile>, AppError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.has_public_profile())
            .map(|u| u.clone())
            .collect())
    }

    async fn count_upcoming_public_events(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.user_id == user_id && e.is_upcoming_public(now))
            .count() as u64)
    }

    async fn set_featured(&self, user_id: Uuid) -> Result<(), AppError> {
        match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.is_featured = true;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {}", user_id))),
        }
    }

    async fn get_featured_teacher(&self) -> Result<Option<TeacherProfile>, AppError> {
        Ok(self.users.iter().find(|u| u.is_featured).map(|u| u.clone()))
    }
}
