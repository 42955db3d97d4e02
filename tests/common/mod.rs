// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use avara::config::Config;
use avara::db::MemoryDb;
use avara::error::AppError;
use avara::middleware::auth::create_session_jwt;
use avara::models::SyncWindow;
use avara::routes::create_router;
use avara::services::{
    FeedSyncer, GoogleClient, GoogleCredentials, RemoteFeaturedSelector, RemoteSyncOutcome,
};
use avara::AppState;
use axum::body::Body;
use axum::http::{header, Request, Response};
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Events reported for every successful fake sync.
#[allow(dead_code)]
pub const EVENTS_PER_FEED: u32 = 5;

/// Feed syncer that succeeds unless told otherwise.
#[derive(Default)]
pub struct FakeSyncer {
    failing: DashSet<Uuid>,
    erroring: DashSet<Uuid>,
    fail_all: AtomicBool,
    error_all: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeSyncer {
    pub fn fail_feed(&self, feed_id: Uuid) {
        self.failing.insert(feed_id);
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Make the call itself error for `feed_id`, as a transport failure would.
    pub fn error_feed(&self, feed_id: Uuid) {
        self.erroring.insert(feed_id);
    }

    pub fn error_all(&self) {
        self.error_all.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSyncer for FakeSyncer {
    async fn sync_feed(
        &self,
        feed_id: Uuid,
        _window: SyncWindow,
    ) -> Result<RemoteSyncOutcome, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.error_all.load(Ordering::SeqCst) || self.erroring.contains(&feed_id) {
            return Err(AppError::RemoteFunction(
                "sync-feed returned HTTP 500".to_string(),
            ));
        }

        if self.fail_all.load(Ordering::SeqCst) || self.failing.contains(&feed_id) {
            return Ok(RemoteSyncOutcome {
                success: false,
                count: 0,
                error: Some("Feed returned HTTP 404".to_string()),
            });
        }

        Ok(RemoteSyncOutcome {
            success: true,
            count: EVENTS_PER_FEED,
            error: None,
        })
    }
}

/// Stand-in for the remote selection function.
#[derive(Default)]
pub struct FakeRemoteSelector {
    fail: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeRemoteSelector {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteFeaturedSelector for FakeRemoteSelector {
    async fn select_featured_teacher(&self) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::RemoteFunction(
                "set-featured-teacher returned HTTP 500".to_string(),
            ));
        }
        Ok("Featured teacher selected by edge function".to_string())
    }
}

/// Router plus handles on everything behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub syncer: Arc<FakeSyncer>,
    pub featured_remote: Arc<FakeRemoteSelector>,
}

#[allow(dead_code)]
impl TestApp {
    /// Session token for `user_id` signed with the test secret.
    pub fn session_token(&self, user_id: Uuid) -> String {
        create_session_jwt(user_id, None, &self.state.config.supabase_jwt_secret)
            .expect("Failed to sign session token")
    }

    /// Send a request as `user_id`.
    pub async fn request_as(
        &self,
        user_id: Uuid,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        use tower::ServiceExt;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.session_token(user_id)),
            );

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

/// Google client pointed at a mock server.
#[allow(dead_code)]
pub fn google_client(config: &Config, base_url: &str) -> GoogleClient {
    let credentials = GoogleCredentials::from_config(config).expect("test config has credentials");
    GoogleClient::new(credentials, Duration::from_secs(config.http_timeout_secs))
        .expect("Failed to build Google client")
        .with_base_url(base_url)
}

fn build_app(config: Config, google: Option<GoogleClient>) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let syncer = Arc::new(FakeSyncer::default());
    let featured_remote = Arc::new(FakeRemoteSelector::default());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        google,
        syncer.clone(),
        featured_remote.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        syncer,
        featured_remote,
    }
}

/// App with Google configured against an unroutable address.
#[allow(dead_code)]
pub fn test_app() -> TestApp {
    let config = Config::test_default();
    let google = google_client(&config, "http://127.0.0.1:9");
    build_app(config, Some(google))
}

/// App whose Google calls go to `base_url` (a wiremock server).
#[allow(dead_code)]
pub fn test_app_with_google(base_url: &str) -> TestApp {
    let config = Config::test_default();
    let google = google_client(&config, base_url);
    build_app(config, Some(google))
}

/// App built from a custom config, without Google.
#[allow(dead_code)]
pub fn test_app_without_google(config: Config) -> TestApp {
    build_app(config, None)
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
