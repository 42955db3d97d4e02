// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Featured-teacher selection.
//!
//! The remote function is tried first. If it fails, the same algorithm
//! runs locally:
//! 1. Clear every `is_featured` flag
//! 2. Load users with both `public_url` and `name`
//! 3. Keep those with at least [`MIN_UPCOMING_PUBLIC_EVENTS`] upcoming public events
//! 4. Flag one of them, chosen uniformly at random
//!
//! The local path is not transactional. Two overlapping runs can interleave
//! and the last `set_featured` wins; flags stay cleared until the next run
//! if the job fails after step 1.

use crate::db::SharedDb;
use crate::error::AppError;
use crate::models::TeacherProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upcoming public events a teacher needs to be featured.
pub const MIN_UPCOMING_PUBLIC_EVENTS: u64 = 3;

/// Remote implementation of the selection; returns its status message.
#[async_trait]
pub trait RemoteFeaturedSelector: Send + Sync {
    async fn select_featured_teacher(&self) -> Result<String, AppError>;
}

/// Which path produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SelectionMethod {
    EdgeFunction,
    Fallback,
}

/// Result of one selection run.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectionReport {
    pub success: bool,
    pub message: String,
    pub method: SelectionMethod,
    pub timestamp: DateTime<Utc>,
}

/// The publicly visible part of the featured teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeaturedTeacher {
    pub id: Uuid,
    pub name: Option<String>,
    pub public_url: Option<String>,
}

impl From<TeacherProfile> for FeaturedTeacher {
    fn from(profile: TeacherProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            public_url: profile.public_url,
        }
    }
}

pub struct FeaturedTeacherSelector {
    db: SharedDb,
    remote: Arc<dyn RemoteFeaturedSelector>,
}

impl FeaturedTeacherSelector {
    pub fn new(db: SharedDb, remote: Arc<dyn RemoteFeaturedSelector>) -> Self {
        Self { db, remote }
    }

    /// Run the selection. Failures are reported, never returned as errors.
    pub async fn select_featured_teacher(&self) -> SelectionReport {
        let timestamp = Utc::now();

        let primary_error = match self.remote.select_featured_teacher().await {
            Ok(message) => {
                tracing::info!(message = %message, "Featured teacher selected by edge function");
                return SelectionReport {
                    success: true,
                    message,
                    method: SelectionMethod::EdgeFunction,
                    timestamp,
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "Edge function failed, running local selection");
                e
            }
        };

        match self.select_locally(timestamp).await {
            Ok(teacher) => SelectionReport {
                success: true,
                message: format!(
                    "Featured teacher selected: {}",
                    teacher.name.as_deref().unwrap_or("unnamed")
                ),
                method: SelectionMethod::Fallback,
                timestamp,
            },
            Err(fallback_error) => {
                tracing::error!(
                    primary = %primary_error,
                    fallback = %fallback_error,
                    "Featured teacher selection failed"
                );
                SelectionReport {
                    success: false,
                    message: format!(
                        "Edge function: {} Fallback: {}",
                        primary_error.public_message(),
                        fallback_error.public_message()
                    ),
                    method: SelectionMethod::Fallback,
                    timestamp,
                }
            }
        }
    }

    async fn select_locally(&self, now: DateTime<Utc>) -> Result<TeacherProfile, AppError> {
        self.db.clear_featured_flags().await?;

        let candidates = self.db.list_featured_candidates().await?;
        let counts = try_join_all(
            candidates
                .iter()
                .map(|c| self.db.count_upcoming_public_events(c.id, now)),
        )
        .await?;

        let eligible: Vec<TeacherProfile> = candidates
            .into_iter()
            .zip(counts)
            .filter(|(_, count)| *count >= MIN_UPCOMING_PUBLIC_EVENTS)
            .map(|(candidate, _)| candidate)
            .collect();

        tracing::debug!(eligible = eligible.len(), "Evaluated featured candidates");

        let chosen = pick_random(eligible)
            .ok_or_else(|| AppError::NotFound("No eligible users".to_string()))?;
        self.db.set_featured(chosen.id).await?;

        tracing::info!(user_id = %chosen.id, "Featured teacher selected locally");
        Ok(chosen)
    }

    /// The currently featured teacher, if any.
    pub async fn featured_teacher(&self) -> Result<Option<FeaturedTeacher>, AppError> {
        Ok(self.db.get_featured_teacher().await?.map(FeaturedTeacher::from))
    }
}

fn pick_random(mut eligible: Vec<TeacherProfile>) -> Option<TeacherProfile> {
    if eligible.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..eligible.len());
    Some(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn profile(name: &str) -> TeacherProfile {
        TeacherProfile {
            id: Uuid::new_v4(),
            name: Some(name.to_string()),
            public_url: Some(format!("/t/{}", name)),
            is_featured: false,
        }
    }

    #[test]
    fn test_pick_random_empty() {
        assert!(pick_random(Vec::new()).is_none());
    }

    #[test]
    fn test_pick_random_reaches_every_candidate() {
        let candidates = vec![profile("a"), profile("b"), profile("c")];
        let ids: HashSet<Uuid> = candidates.iter().map(|c| c.id).collect();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let chosen = pick_random(candidates.clone()).unwrap();
            assert!(ids.contains(&chosen.id));
            seen.insert(chosen.id);
        }
        assert_eq!(seen, ids);
    }

    #[test]
    fn test_report_serialization() {
        let report = SelectionReport {
            success: true,
            message: "ok".to_string(),
            method: SelectionMethod::EdgeFunction,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["method"], "edge_function");
        assert!(value["timestamp"].is_string());
    }
}
