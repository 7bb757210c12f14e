// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Funnel, lead, ROI and subscription routes for authenticated users.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Lead, Platform, PlatformSnapshot, SalesFunnel};
use crate::services::connectors::PlatformCredentials;
use crate::services::funnels::owned_funnel;
use crate::services::integration::{ImportSummary, DEFAULT_IMPORT_DAYS};
use crate::services::roi::{BaselineSummary, PerformanceSummary, RoiSummary};
use crate::services::subscription::SubscriptionOverview;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Funnel routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/funnels", get(list_funnels))
        .route("/api/funnels/{id}", get(get_funnel))
        .route("/api/funnels/{id}/leads", get(list_leads))
        .route("/api/funnels/{id}/baseline", post(establish_baseline))
        .route("/api/funnels/{id}/performance", post(calculate_performance))
        .route("/api/funnels/{id}/roi", get(roi_summary))
        .route("/api/funnels/{id}/import", post(import_baseline))
        .route("/api/subscription", get(subscription))
}

// ─── Funnels & Leads ─────────────────────────────────────────

#[derive(Serialize)]
pub struct FunnelsResponse {
    pub funnels: Vec<SalesFunnel>,
    pub total: usize,
}

async fn list_funnels(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FunnelsResponse>> {
    let funnels = state.db.list_funnels_for_user(user.user_id).await?;
    Ok(Json(FunnelsResponse {
        total: funnels.len(),
        funnels,
    }))
}

async fn get_funnel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SalesFunnel>> {
    Ok(Json(owned_funnel(&state.db, user.user_id, &id).await?))
}

#[derive(Deserialize)]
struct LeadsQuery {
    #[serde(default = "default_leads_limit")]
    limit: u32,
}

fn default_leads_limit() -> u32 {
    50
}

const MAX_LEADS_LIMIT: u32 = 200;

#[derive(Serialize)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
    pub limit: u32,
}

/// Leads for a funnel, highest score first.
async fn list_leads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(params): Query<LeadsQuery>,
) -> Result<Json<LeadsResponse>> {
    owned_funnel(&state.db, user.user_id, &id).await?;

    let limit = params.limit.clamp(1, MAX_LEADS_LIMIT);
    let leads = state.db.list_leads_for_funnel(&id, limit).await?;

    Ok(Json(LeadsResponse { leads, limit }))
}

// ─── ROI ─────────────────────────────────────────────────────

/// Establish a baseline from a snapshot supplied by the client.
async fn establish_baseline(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BaselineSummary>> {
    let snapshot = PlatformSnapshot::from_value(body)?;
    Ok(Json(
        state
            .roi
            .establish_baseline(user.user_id, &id, snapshot)
            .await?,
    ))
}

async fn calculate_performance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(current_period): Json<serde_json::Value>,
) -> Result<Json<PerformanceSummary>> {
    Ok(Json(
        state
            .roi
            .calculate_performance(user.user_id, &id, current_period)
            .await?,
    ))
}

async fn roi_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<RoiSummary>> {
    Ok(Json(state.roi.summary(user.user_id, &id).await?))
}

#[derive(Deserialize, Validate)]
struct ImportRequest {
    platform: String,
    credentials: PlatformCredentials,
    #[serde(default = "default_import_days")]
    #[validate(range(min = 1, max = 365))]
    days: u32,
}

fn default_import_days() -> u32 {
    DEFAULT_IMPORT_DAYS
}

/// Import a platform's history and make it the funnel's baseline.
async fn import_baseline(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ImportSummary>> {
    body.validate()?;
    let platform: Platform = body.platform.parse()?;

    tracing::info!(
        user_id = user.user_id,
        funnel_id = %id,
        platform = %platform,
        days = body.days,
        "Baseline import requested"
    );

    Ok(Json(
        state
            .integrations
            .import_baseline(user.user_id, &id, platform, body.credentials, body.days)
            .await?,
    ))
}

// ─── Subscription ────────────────────────────────────────────

async fn subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubscriptionOverview>> {
    Ok(Json(state.subscriptions.overview(user.user_id).await?))
}
