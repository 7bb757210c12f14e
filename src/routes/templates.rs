// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vertical template routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{TemplatePreview, TemplateRecommendation, UsageResource, VerticalTemplate};
use crate::services::templates::{IndustryMatch, TemplateStats};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Template routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/templates", get(list_templates))
        .route("/api/templates/stats", get(template_stats))
        .route("/api/templates/industry-match", post(industry_match))
        .route("/api/templates/create-funnel", post(create_funnel))
        .route("/api/templates/{id}", get(get_template))
        .route("/api/templates/{id}/preview", get(preview_template))
}

#[derive(Deserialize)]
struct TemplatesQuery {
    industry: Option<String>,
    revenue: Option<String>,
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<VerticalTemplate>,
    pub recommendations: Vec<TemplateRecommendation>,
}

/// All templates plus recommendations for the optional profile.
async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TemplatesQuery>,
) -> Json<TemplatesResponse> {
    let templates = &state.templates;
    Json(TemplatesResponse {
        templates: templates.templates().to_vec(),
        recommendations: templates
            .recommendations(params.industry.as_deref(), params.revenue.as_deref()),
    })
}

async fn template_stats(State(state): State<Arc<AppState>>) -> Json<TemplateStats> {
    Json(state.templates.stats())
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VerticalTemplate>> {
    state
        .templates
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {}", id)))
}

async fn preview_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplatePreview>> {
    state
        .templates
        .preview(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {}", id)))
}

#[derive(Deserialize)]
struct IndustryMatchRequest {
    industry: Option<String>,
    #[serde(alias = "revenue_range")]
    revenue: Option<String>,
    company_size: Option<String>,
}

async fn industry_match(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IndustryMatchRequest>,
) -> Json<IndustryMatch> {
    Json(state.templates.industry_match(
        body.industry.as_deref(),
        body.revenue.as_deref(),
        body.company_size.as_deref(),
    ))
}

// ─── Funnel Creation ─────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateFunnelRequest {
    #[validate(length(min = 1))]
    template_id: String,
    #[validate(length(max = 120))]
    custom_name: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateFunnelResponse {
    pub funnel_id: String,
    pub template_applied: String,
    pub stages_configured: usize,
    pub quick_wins: Vec<String>,
    pub redirect_url: String,
}

/// Create a funnel from a template, subject to the plan's funnel limit.
async fn create_funnel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateFunnelRequest>,
) -> Result<Json<CreateFunnelResponse>> {
    body.validate()?;

    let funnel = state.templates.build_funnel(
        user.user_id,
        &body.template_id,
        body.custom_name.as_deref(),
    )?;

    // The count and the insert are separate requests, so two concurrent
    // creates at the limit can both pass. The limit is a billing soft cap.
    state
        .subscriptions
        .require_within_limits(user.user_id, UsageResource::SalesFunnels)
        .await?;

    state.db.upsert_funnel(&funnel).await?;

    state
        .subscriptions
        .track_usage(
            user.user_id,
            UsageResource::SalesFunnels,
            &funnel.id,
            serde_json::json!({ "template_id": body.template_id }),
        )
        .await;

    tracing::info!(
        user_id = user.user_id,
        funnel_id = %funnel.id,
        template_id = %body.template_id,
        "Funnel created from template"
    );

    let quick_wins = state
        .templates
        .get(&body.template_id)
        .map(|t| t.quick_wins.clone())
        .unwrap_or_default();

    Ok(Json(CreateFunnelResponse {
        redirect_url: format!("/sales-funnel/funnel/{}", funnel.id),
        template_applied: funnel.target_market.clone(),
        stages_configured: funnel.stages.len(),
        funnel_id: funnel.id,
        quick_wins,
    }))
}
