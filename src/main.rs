// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Funnel Optimizer API Server
//!
//! Serves vertical funnel templates, platform baseline imports and
//! performance-fee calculations.

use funnel_optimizer::{
    config::Config,
    db::FirestoreDb,
    services::{
        IntegrationService, KmsService, RoiService, SubscriptionService, TemplateService,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Funnel Optimizer API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Load the template catalog; a bad catalog is fatal
    tracing::info!(path = %config.templates_path, "Loading vertical templates");
    let templates = TemplateService::load_from_file(&config.templates_path)?;
    tracing::info!(count = templates.templates().len(), "Vertical templates loaded");

    // Initialize KMS service
    let kms = KmsService::new(
        &config.gcp_project_id,
        &config.gcp_region,
        KmsService::CREDENTIALS_KEY,
    )
    .await?;
    tracing::info!("KMS service initialized");

    let subscriptions = SubscriptionService::new(db.clone());
    let roi = RoiService::new(db.clone(), subscriptions.clone());
    let integrations = IntegrationService::new(
        db.clone(),
        Arc::new(kms),
        subscriptions.clone(),
        roi.clone(),
        config.webhook_domain.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        templates,
        subscriptions,
        roi,
        integrations,
    });

    // Build router
    let app = funnel_optimizer::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("funnel_optimizer=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
