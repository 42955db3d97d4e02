// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the managed edge functions.
//!
//! Functions live at `{SUPABASE_URL}/functions/v1/<name>` and are called
//! with the service-role key.

use crate::error::AppError;
use crate::models::SyncWindow;
use crate::services::featured::RemoteFeaturedSelector;
use crate::services::sync::{FeedSyncer, RemoteSyncOutcome};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

const SYNC_FEED: &str = "sync-feed";
const SET_FEATURED_TEACHER: &str = "set-featured-teacher";

/// Edge function client.
#[derive(Clone)]
pub struct EdgeFunctions {
    http: reqwest::Client,
    functions_url: String,
    service_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncFeedRequest {
    feed_id: Uuid,
    time_min: String,
    time_max: String,
}

#[derive(Deserialize)]
struct FeaturedTeacherResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl EdgeFunctions {
    pub fn new(supabase_url: &str, service_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            functions_url: format!("{}/functions/v1", supabase_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        })
    }

    async fn invoke<B, R>(&self, name: &'static str, body: &B) -> Result<R, AppError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.functions_url, name))
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::RemoteFunction(format!("{} timed out", name))
                } else {
                    AppError::RemoteFunction(format!("{} request failed: {}", name, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(function = name, status = %status, body = %body, "Edge function failed");
            return Err(AppError::RemoteFunction(format!(
                "{} returned HTTP {}",
                name, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RemoteFunction(format!("{} returned invalid JSON: {}", name, e)))
    }
}

#[async_trait]
impl FeedSyncer for EdgeFunctions {
    async fn sync_feed(
        &self,
        feed_id: Uuid,
        window: SyncWindow,
    ) -> Result<RemoteSyncOutcome, AppError> {
        let request = SyncFeedRequest {
            feed_id,
            time_min: format_utc_rfc3339(window.start),
            time_max: format_utc_rfc3339(window.end),
        };

        self.invoke(SYNC_FEED, &request).await
    }
}

#[async_trait]
impl RemoteFeaturedSelector for EdgeFunctions {
    async fn select_featured_teacher(&self) -> Result<String, AppError> {
        let response: FeaturedTeacherResponse = self
            .invoke(SET_FEATURED_TEACHER, &serde_json::json!({}))
            .await?;

        if !response.success {
            return Err(AppError::RemoteFunction(
                response
                    .error
                    .unwrap_or_else(|| format!("{} reported failure", SET_FEATURED_TEACHER)),
            ));
        }

        Ok(response
            .message
            .unwrap_or_else(|| "Featured teacher selected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sync_request_shape() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let window = SyncWindow::upcoming(start, 90);
        let request = SyncFeedRequest {
            feed_id: Uuid::nil(),
            time_min: format_utc_rfc3339(window.start),
            time_max: format_utc_rfc3339(window.end),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["feedId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["timeMin"], "2026-03-01T00:00:00Z");
        assert_eq!(value["timeMax"], "2026-05-30T00:00:00Z");
    }

    #[test]
    fn test_functions_url() {
        let functions = EdgeFunctions::new(
            "https://project.supabase.co/",
            "key",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            functions.functions_url,
            "https://project.supabase.co/functions/v1"
        );
    }
}
