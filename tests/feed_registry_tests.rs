// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar feed lifecycle through the HTTP API.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;

const FEEDS_PATH: &str = "/api/calendar-feeds";

async fn create_ics_feed(app: &common::TestApp, user_id: Uuid) -> serde_json::Value {
    let response = app
        .request_as(
            user_id,
            "POST",
            FEEDS_PATH,
            Some(json!({
                "feedUrl": "https://calendar.example.com/teacher.ics",
                "calendarName": "Studio classes"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    common::json_body(response).await
}

#[tokio::test]
async fn test_create_ics_feed_syncs_immediately() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();

    let body = create_ics_feed(&app, user_id).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["feed"]["feed_url"], "https://calendar.example.com/teacher.ics");
    assert_eq!(body["feed"]["sync_approach"], "yoga_only");
    assert!(body["feed"]["last_synced_at"].is_string());
    assert_eq!(body["syncResult"]["success"], true);
    assert_eq!(body["syncResult"]["count"], common::EVENTS_PER_FEED);
    assert_eq!(app.syncer.calls(), 1);
}

#[tokio::test]
async fn test_failed_first_sync_keeps_feed() {
    let app = common::test_app();
    app.syncer.fail_all();
    let user_id = Uuid::new_v4();

    let body = create_ics_feed(&app, user_id).await;
    assert_eq!(body["success"], true);
    assert!(body["feed"]["last_synced_at"].is_null());
    assert_eq!(body["syncResult"]["success"], false);
    assert_eq!(body["syncResult"]["error"], "Feed returned HTTP 404");

    let feed_id: Uuid = body["feed"]["id"].as_str().unwrap().parse().unwrap();
    let stored = app.db.feed(feed_id).unwrap();
    assert!(stored.last_synced_at.is_none());
}

#[tokio::test]
async fn test_erroring_first_sync_keeps_feed() {
    let app = common::test_app();
    app.syncer.error_all();
    let user_id = Uuid::new_v4();

    let body = create_ics_feed(&app, user_id).await;
    assert_eq!(body["success"], true);
    assert!(body["feed"]["last_synced_at"].is_null());
    assert_eq!(body["syncResult"]["success"], false);
    assert_eq!(body["syncResult"]["count"], 0);
    // Transport details stay in the logs
    let error = body["syncResult"]["error"].as_str().unwrap();
    assert!(!error.contains("HTTP 500"), "{}", error);

    let feed_id: Uuid = body["feed"]["id"].as_str().unwrap().parse().unwrap();
    assert!(app.db.feed(feed_id).unwrap().last_synced_at.is_none());
    assert_eq!(app.syncer.calls(), 1);
}

#[tokio::test]
async fn test_create_feed_validates_input() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();

    for body in [
        json!({ "feedUrl": "not a url" }),
        json!({ "feedUrl": "https://example.com/a.ics", "calendarName": "" }),
        json!({ "feedUrl": "https://example.com/a.ics", "syncApproach": "all" }),
    ] {
        let response = app
            .request_as(user_id, "POST", FEEDS_PATH, Some(body.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }

    assert_eq!(app.syncer.calls(), 0);
}

#[tokio::test]
async fn test_list_feeds_newest_first() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();

    let first = create_ics_feed(&app, user_id).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = create_ics_feed(&app, user_id).await;

    // Another user's feed is not listed
    create_ics_feed(&app, Uuid::new_v4()).await;

    let response = app.request_as(user_id, "GET", FEEDS_PATH, None).await;
    let body = common::json_body(response).await;
    let ids: Vec<&str> = body["feeds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();

    assert_eq!(
        ids,
        vec![
            second["feed"]["id"].as_str().unwrap(),
            first["feed"]["id"].as_str().unwrap()
        ]
    );
}

#[tokio::test]
async fn test_update_sync_approach() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();
    let created = create_ics_feed(&app, user_id).await;
    let path = format!("{}/{}", FEEDS_PATH, created["feed"]["id"].as_str().unwrap());

    let response = app
        .request_as(
            user_id,
            "PATCH",
            &path,
            Some(json!({ "syncApproach": "mixed_calendar" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["feed"]["sync_approach"], "mixed_calendar");

    // snake_case key is accepted too
    let response = app
        .request_as(user_id, "PATCH", &path, Some(json!({ "sync_approach": "yoga_only" })))
        .await;
    let body = common::json_body(response).await;
    assert_eq!(body["feed"]["sync_approach"], "yoga_only");
}

#[tokio::test]
async fn test_invalid_sync_approach_changes_nothing() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();
    let created = create_ics_feed(&app, user_id).await;
    let feed_id: Uuid = created["feed"]["id"].as_str().unwrap().parse().unwrap();
    let path = format!("{}/{}", FEEDS_PATH, feed_id);

    let response = app
        .request_as(user_id, "PATCH", &path, Some(json!({ "syncApproach": "everything" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.request_as(user_id, "PATCH", &path, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        app.db.feed(feed_id).unwrap().sync_approach,
        avara::models::SyncApproach::YogaOnly
    );
}

#[tokio::test]
async fn test_other_users_feed_is_not_found() {
    let app = common::test_app();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let created = create_ics_feed(&app, owner).await;
    let feed_id: Uuid = created["feed"]["id"].as_str().unwrap().parse().unwrap();
    let path = format!("{}/{}", FEEDS_PATH, feed_id);

    let response = app
        .request_as(
            intruder,
            "PATCH",
            &path,
            Some(json!({ "syncApproach": "mixed_calendar" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request_as(intruder, "DELETE", &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let feed = app.db.feed(feed_id).unwrap();
    assert_eq!(feed.user_id, owner);
    assert_eq!(feed.sync_approach, avara::models::SyncApproach::YogaOnly);
}

#[tokio::test]
async fn test_delete_feed() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();
    let created = create_ics_feed(&app, user_id).await;
    let feed_id: Uuid = created["feed"]["id"].as_str().unwrap().parse().unwrap();
    let path = format!("{}/{}", FEEDS_PATH, feed_id);

    let response = app.request_as(user_id, "DELETE", &path, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.db.feed(feed_id).is_none());

    let response = app.request_as(user_id, "DELETE", &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_latest_feed_lookup() {
    let app = common::test_app();
    let user_id = Uuid::new_v4();

    let path = format!("{}/latest?userId={}", FEEDS_PATH, user_id);
    let response = app.request_as(user_id, "GET", &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let created = create_ics_feed(&app, user_id).await;
    let response = app.request_as(user_id, "GET", &path, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["feedId"], created["feed"]["id"]);

    // Another user's id looks like a missing feed
    let response = app.request_as(Uuid::new_v4(), "GET", &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for bad in ["", "?userId=", "?userId=not-a-uuid"] {
        let response = app
            .request_as(user_id, "GET", &format!("{}/latest{}", FEEDS_PATH, bad), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {}", bad);
    }
}
