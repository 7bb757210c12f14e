// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Industry vertical templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::funnel::FunnelStage;

/// Adoption figures shown alongside a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateUsageStats {
    pub usage_count: u32,
    pub avg_improvement: String,
    pub success_rate: String,
    pub popular_optimizations: Vec<String>,
}

/// Preconfigured funnel for an industry segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalTemplate {
    pub template_id: String,
    pub name: String,
    pub description: String,
    pub target_revenue_range: String,
    /// e.g. `{"ideal_aov": "$60-$300"}`
    #[serde(default)]
    pub ideal_deal_size: BTreeMap<String, String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub stages: Vec<FunnelStage>,
    #[serde(default)]
    pub benchmark_kpis: BTreeMap<String, String>,
    #[serde(default)]
    pub quick_wins: Vec<String>,
    #[serde(default)]
    pub automation_triggers: Vec<String>,
    pub usage_stats: TemplateUsageStats,
}

/// Scored template suggestion.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TemplateRecommendation {
    pub template_id: String,
    pub name: String,
    pub description: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub benchmark_kpis: BTreeMap<String, String>,
    pub quick_wins_count: usize,
    pub stages_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagePreview {
    pub name: String,
    pub description: String,
    pub benchmark_conversion: f64,
    pub key_metrics: Vec<String>,
}

/// Condensed template view for the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePreview {
    pub name: String,
    pub description: String,
    pub stages: Vec<StagePreview>,
    pub benchmark_kpis: BTreeMap<String, String>,
    pub quick_wins: Vec<String>,
    pub total_stages: usize,
    pub estimated_setup_time: String,
}
