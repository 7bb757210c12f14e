// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use funnel_optimizer::config::Config;
use funnel_optimizer::db::FirestoreDb;
use funnel_optimizer::middleware::auth::create_jwt;
use funnel_optimizer::routes::create_router;
use funnel_optimizer::services::connectors::ConnectorEndpoints;
use funnel_optimizer::services::{
    IntegrationService, KmsService, RoiService, SubscriptionService, TemplateService,
};
use funnel_optimizer::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// The bundled template catalog.
#[allow(dead_code)]
pub fn test_templates() -> TemplateService {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vertical_templates.json");
    TemplateService::load_from_file(path).expect("Failed to load bundled templates")
}

/// Build app state around `db`, routing connector calls to `endpoints`.
#[allow(dead_code)]
pub fn test_state(db: FirestoreDb, endpoints: ConnectorEndpoints) -> Arc<AppState> {
    let config = Config::default();
    let subscriptions = SubscriptionService::new(db.clone());
    let roi = RoiService::new(db.clone(), subscriptions.clone());
    let integrations = IntegrationService::new(
        db.clone(),
        Arc::new(KmsService::new_mock()),
        subscriptions.clone(),
        roi.clone(),
        config.webhook_domain.clone(),
    )
    .with_endpoints(endpoints);

    Arc::new(AppState {
        config,
        db,
        templates: test_templates(),
        subscriptions,
        roi,
        integrations,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db_offline(), ConnectorEndpoints::default());
    (create_router(state.clone()), state)
}

/// Session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("Failed to create JWT")
}

/// Generate a unique user ID for test isolation.
#[allow(dead_code)]
pub fn unique_user_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
