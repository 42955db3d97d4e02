// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! avara. API Server
//!
//! Calendar integrations, feed sync orchestration and featured-teacher
//! selection for the avara. web app.

use avara::{
    config::Config,
    db::SupabaseDb,
    services::{EdgeFunctions, GoogleClient, GoogleCredentials},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting avara. API");

    let timeout = Duration::from_secs(config.http_timeout_secs);

    let db = SupabaseDb::new(
        &config.supabase_url,
        &config.supabase_service_role_key,
        timeout,
    )?;

    let functions = Arc::new(EdgeFunctions::new(
        &config.supabase_url,
        &config.supabase_service_role_key,
        timeout,
    )?);

    let google = match GoogleCredentials::from_config(&config) {
        Some(credentials) => Some(GoogleClient::new(credentials, timeout)?),
        None => {
            tracing::warn!("Google OAuth credentials not set, calendar integration disabled");
            None
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(db),
        google,
        functions.clone(),
        functions,
    ));

    // Build router
    let app = avara::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("avara=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
