// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar feed routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CalendarFeed, FeedSource, SyncApproach};
use crate::services::CreatedFeed;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Feed routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calendar-feeds", get(list_feeds).post(create_feed))
        .route("/api/calendar-feeds/latest", get(latest_feed))
        .route(
            "/api/calendar-feeds/{id}",
            patch(update_sync_approach).delete(delete_feed),
        )
}

/// Parse an optional sync approach, defaulting to `yoga_only`.
pub(crate) fn parse_sync_approach(raw: Option<&str>) -> Result<SyncApproach> {
    Ok(raw.map(str::parse::<SyncApproach>).transpose()?.unwrap_or_default())
}

// ─── List / create ───────────────────────────────────────────

#[derive(Serialize)]
pub struct FeedsResponse {
    pub feeds: Vec<CalendarFeed>,
}

async fn list_feeds(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FeedsResponse>> {
    let feeds = state.feeds.list_feeds(user.user_id).await?;
    Ok(Json(FeedsResponse { feeds }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedRequest {
    #[validate(url)]
    pub feed_url: String,
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub calendar_name: Option<String>,
    #[serde(default)]
    pub sync_approach: Option<String>,
}

#[derive(Serialize)]
pub struct CreateFeedResponse {
    pub success: bool,
    #[serde(flatten)]
    pub created: CreatedFeed,
}

/// Add an ICS feed and run its first sync.
async fn create_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateFeedRequest>,
) -> Result<Json<CreateFeedResponse>> {
    body.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid feed: {}", e)))?;
    let sync_approach = parse_sync_approach(body.sync_approach.as_deref())?;

    let source = FeedSource::Ics {
        url: body.feed_url,
        name: body.calendar_name,
    };
    let created = state
        .feeds
        .create_feed(user.user_id, source, sync_approach)
        .await?;

    Ok(Json(CreateFeedResponse {
        success: true,
        created,
    }))
}

// ─── Latest ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LatestQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestFeedResponse {
    pub feed_id: Uuid,
}

/// Most recent feed id. Only the caller's own feeds are visible.
async fn latest_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<LatestFeedResponse>> {
    let requested = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;
    let requested: Uuid = requested
        .parse()
        .map_err(|_| AppError::BadRequest("userId must be a UUID".to_string()))?;

    if requested != user.user_id {
        return Err(AppError::NotFound("No calendar feed found".to_string()));
    }

    let feed = state.feeds.latest_feed(user.user_id).await?;
    Ok(Json(LatestFeedResponse { feed_id: feed.id }))
}

// ─── Update / delete ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedRequest {
    #[serde(default, alias = "sync_approach")]
    pub sync_approach: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateFeedResponse {
    pub success: bool,
    pub feed: CalendarFeed,
    pub message: String,
}

async fn update_sync_approach(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(feed_id): Path<Uuid>,
    Json(body): Json<UpdateFeedRequest>,
) -> Result<Json<UpdateFeedResponse>> {
    let approach = body
        .sync_approach
        .ok_or_else(|| AppError::BadRequest("syncApproach is required".to_string()))?;

    let feed = state
        .feeds
        .update_sync_approach(user.user_id, feed_id, &approach)
        .await?;

    Ok(Json(UpdateFeedResponse {
        success: true,
        message: format!("Sync approach set to {}", feed.sync_approach),
        feed,
    }))
}

#[derive(Serialize)]
pub struct DeleteFeedResponse {
    pub success: bool,
    pub message: String,
}

async fn delete_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(feed_id): Path<Uuid>,
) -> Result<Json<DeleteFeedResponse>> {
    state.feeds.delete_feed(user.user_id, feed_id).await?;

    Ok(Json(DeleteFeedResponse {
        success: true,
        message: "Calendar feed deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_approach() {
        assert_eq!(parse_sync_approach(None).unwrap(), SyncApproach::YogaOnly);
        assert_eq!(
            parse_sync_approach(Some("mixed_calendar")).unwrap(),
            SyncApproach::MixedCalendar
        );
        assert!(matches!(
            parse_sync_approach(Some("all")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_create_request_validation() {
        let valid: CreateFeedRequest = serde_json::from_value(serde_json::json!({
            "feedUrl": "https://calendar.example.com/teacher.ics",
            "calendarName": "Studio"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let bad_url: CreateFeedRequest =
            serde_json::from_value(serde_json::json!({ "feedUrl": "not a url" })).unwrap();
        assert!(bad_url.validate().is_err());

        let long_name: CreateFeedRequest = serde_json::from_value(serde_json::json!({
            "feedUrl": "https://calendar.example.com/teacher.ics",
            "calendarName": "x".repeat(201)
        }))
        .unwrap();
        assert!(long_name.validate().is_err());
    }
}
