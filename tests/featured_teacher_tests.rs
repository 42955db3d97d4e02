// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Featured teacher selection job and public lookup.

use avara::config::Config;
use avara::models::{ScheduledEvent, TeacherProfile, Visibility};
use avara::services::SelectionMethod;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn teacher(name: &str, featured: bool) -> TeacherProfile {
    TeacherProfile {
        id: Uuid::new_v4(),
        name: Some(name.to_string()),
        public_url: Some(name.to_lowercase()),
        is_featured: featured,
    }
}

fn add_events(app: &common::TestApp, user_id: Uuid, upcoming_public: usize) {
    let now = Utc::now();
    for i in 0..upcoming_public {
        app.db.insert_event(ScheduledEvent {
            id: Uuid::new_v4(),
            user_id,
            start_time: now + Duration::days(i as i64 + 1),
            visibility: Visibility::Public,
        });
    }
    // Neither of these counts
    app.db.insert_event(ScheduledEvent {
        id: Uuid::new_v4(),
        user_id,
        start_time: now - Duration::days(1),
        visibility: Visibility::Public,
    });
    app.db.insert_event(ScheduledEvent {
        id: Uuid::new_v4(),
        user_id,
        start_time: now + Duration::days(1),
        visibility: Visibility::Private,
    });
}

/// A has 2 upcoming public events and was featured last time, B has 3,
/// C has 5 but no public URL. Only B is eligible.
fn seed_teachers(app: &common::TestApp) -> (Uuid, Uuid, Uuid) {
    let a = teacher("Asha", true);
    let b = teacher("Bea", false);
    let c = TeacherProfile {
        public_url: None,
        ..teacher("Cyrus", false)
    };
    let ids = (a.id, b.id, c.id);

    add_events(app, a.id, 2);
    add_events(app, b.id, 3);
    add_events(app, c.id, 5);
    app.db.insert_user(a);
    app.db.insert_user(b);
    app.db.insert_user(c);

    ids
}

#[tokio::test]
async fn test_fallback_picks_only_eligible_teacher() {
    let app = common::test_app();
    app.featured_remote.set_failing(true);
    let (_, b, _) = seed_teachers(&app);

    let report = app.state.featured.select_featured_teacher().await;

    assert!(report.success, "{}", report.message);
    assert_eq!(report.method, SelectionMethod::Fallback);
    assert_eq!(report.message, "Featured teacher selected: Bea");
    assert_eq!(app.db.featured_user_ids(), vec![b]);
    assert_eq!(app.featured_remote.calls(), 1);

    let featured = app.state.featured.featured_teacher().await.unwrap().unwrap();
    assert_eq!(featured.id, b);
    assert_eq!(featured.public_url.as_deref(), Some("bea"));
}

#[tokio::test]
async fn test_edge_function_success_skips_fallback() {
    let app = common::test_app();
    let (a, _, _) = seed_teachers(&app);

    let report = app.state.featured.select_featured_teacher().await;

    assert!(report.success);
    assert_eq!(report.method, SelectionMethod::EdgeFunction);
    // The local flags were left to the remote side
    assert_eq!(app.db.featured_user_ids(), vec![a]);
}

#[tokio::test]
async fn test_both_paths_fail_clears_flags() {
    let app = common::test_app();
    app.featured_remote.set_failing(true);
    let b = teacher("Bea", true);
    let b_id = b.id;
    add_events(&app, b_id, 1);
    app.db.insert_user(b);

    let report = app.state.featured.select_featured_teacher().await;

    assert!(!report.success);
    assert_eq!(report.method, SelectionMethod::Fallback);
    assert!(report.message.starts_with("Edge function: "));
    assert!(report.message.contains("Fallback: No eligible users"));
    assert!(app.db.featured_user_ids().is_empty());
    assert!(app.state.featured.featured_teacher().await.unwrap().is_none());
}

#[tokio::test]
async fn test_job_endpoint_status_codes() {
    let app = common::test_app();
    app.featured_remote.set_failing(true);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/set-featured-teacher")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["method"], "fallback");
    assert!(body["timestamp"].is_string());

    seed_teachers(&app);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/set-featured-teacher")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_job_requires_cron_secret_when_configured() {
    let config = Config {
        cron_secret: Some("cron-secret".to_string()),
        ..Config::test_default()
    };
    let app = common::test_app_without_google(config);

    for authorization in [None, Some("Bearer wrong"), Some("cron-secret")] {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/set-featured-teacher");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }

        let response = app
            .router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(app.featured_remote.calls(), 0);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/set-featured-teacher")
                .header(header::AUTHORIZATION, "Bearer cron-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.featured_remote.calls(), 1);
}

#[tokio::test]
async fn test_public_featured_teacher_lookup() {
    let app = common::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/featured-teacher")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::json_body(response).await["teacher"].is_null());

    let (a, _, _) = seed_teachers(&app);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/featured-teacher")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["teacher"]["id"], a.to_string());
    assert_eq!(body["teacher"]["name"], "Asha");
    assert_eq!(body["teacher"]["publicUrl"], "asha");
}
