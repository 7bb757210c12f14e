// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform connector routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::Platform;
use crate::services::connectors::{
    supported_platforms, ConnectionInfo, PlatformCredentials, PlatformSummary,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Connector routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/connectors", get(list_connectors))
        .route("/api/connectors/{platform}/test", post(test_connection))
}

#[derive(Serialize)]
pub struct ConnectorsResponse {
    pub platforms: Vec<PlatformSummary>,
}

async fn list_connectors() -> Json<ConnectorsResponse> {
    Json(ConnectorsResponse {
        platforms: supported_platforms(),
    })
}

#[derive(Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub platform: Platform,
    pub connection: ConnectionInfo,
}

/// Check credentials against the platform without storing them.
async fn test_connection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(platform): Path<String>,
    Json(credentials): Json<PlatformCredentials>,
) -> Result<Json<TestConnectionResponse>> {
    let platform: Platform = platform.parse()?;

    let connection = state
        .integrations
        .test_connection(user.user_id, platform, credentials)
        .await?;

    Ok(Json(TestConnectionResponse {
        success: true,
        platform,
        connection,
    }))
}
