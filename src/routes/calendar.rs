// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google calendar picker and sync trigger routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CalendarFeed, CalendarRef, Provider, SyncSummary};
use crate::routes::feeds::parse_sync_approach;
use crate::services::CalendarListing;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Calendar routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/calendar/google/calendars",
            get(list_calendars).post(select_calendars),
        )
        .route("/api/calendar/sync", post(sync_latest))
        .route("/api/calendar/sync-all", post(sync_all))
}

// ─── Calendar picker ─────────────────────────────────────────

/// Always 200; failures are reported in `error`.
async fn list_calendars(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CalendarListing>> {
    Ok(Json(state.calendars()?.list_calendars(user.user_id).await))
}

#[derive(Debug, Deserialize)]
pub struct SelectedCalendar {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectCalendarsRequest {
    pub calendars: Vec<SelectedCalendar>,
    #[serde(default)]
    pub sync_approach: Option<String>,
}

#[derive(Serialize)]
pub struct SelectCalendarsResponse {
    pub success: bool,
    pub feeds: Vec<CalendarFeed>,
}

/// Create feeds for the calendars picked by the user.
async fn select_calendars(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectCalendarsRequest>,
) -> Result<Json<SelectCalendarsResponse>> {
    if body.calendars.is_empty() {
        return Err(AppError::BadRequest("No calendars selected".to_string()));
    }
    let sync_approach = parse_sync_approach(body.sync_approach.as_deref())?;

    let calendars = body
        .calendars
        .into_iter()
        .map(|calendar| {
            // The id is stored colon-delimited; it may not contain one itself.
            if calendar.id.is_empty() || calendar.id.contains(':') {
                return Err(AppError::BadRequest(format!(
                    "Invalid calendar id '{}'",
                    calendar.id
                )));
            }
            let name = calendar.summary.unwrap_or_else(|| calendar.id.clone());
            Ok(CalendarRef::new(Provider::Google, calendar.id, name))
        })
        .collect::<Result<Vec<_>>>()?;

    let feeds = state
        .feeds
        .select_calendars(user.user_id, calendars, sync_approach)
        .await?;

    Ok(Json(SelectCalendarsResponse {
        success: true,
        feeds,
    }))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub feed_id: Uuid,
}

/// Sync the caller's most recent feed.
async fn sync_latest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<SyncResponse>)> {
    let result = state.sync.sync_latest_feed(user.user_id).await?;

    let (status, message) = if result.success {
        (StatusCode::OK, format!("Synced {} events", result.count))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            result
                .error
                .unwrap_or_else(|| "Sync failed".to_string()),
        )
    };

    Ok((
        status,
        Json(SyncResponse {
            success: result.success,
            message,
            feed_id: result.feed_id,
        }),
    ))
}

/// Sync every feed. Partial failure still answers 200.
async fn sync_all(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SyncSummary>> {
    Ok(Json(state.sync.sync_all_feeds_for_user(user.user_id).await?))
}
