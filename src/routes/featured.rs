// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Featured-teacher routes.

use crate::error::Result;
use crate::middleware::require_cron_secret;
use crate::services::{FeaturedTeacher, SelectionReport};
use crate::AppState;
use axum::{extract::State, http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Public read plus the scheduler-triggered selection job.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let job = Router::new()
        .route(
            "/api/set-featured-teacher",
            get(set_featured_teacher).post(set_featured_teacher),
        )
        .route_layer(middleware::from_fn_with_state(state, require_cron_secret));

    Router::new()
        .route("/api/featured-teacher", get(get_featured_teacher))
        .merge(job)
}

/// Run the selection job; 500 when both paths fail.
async fn set_featured_teacher(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SelectionReport>) {
    let report = state.featured.select_featured_teacher().await;

    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report))
}

#[derive(Serialize)]
pub struct FeaturedTeacherResponse {
    pub teacher: Option<FeaturedTeacher>,
}

async fn get_featured_teacher(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeaturedTeacherResponse>> {
    let teacher = state.featured.featured_teacher().await?;
    Ok(Json(FeaturedTeacherResponse { teacher }))
}
