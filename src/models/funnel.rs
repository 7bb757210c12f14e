// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sales funnel model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::roi::{PerformanceRecord, RoiBaseline};

/// One stage of a funnel with its industry benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub name: String,
    pub description: String,
    /// Expected conversion to the next stage (percent)
    pub benchmark_conversion: f64,
    /// Expected time until the next stage (seconds)
    pub benchmark_time_to_next: u64,
    #[serde(default)]
    pub key_metrics: Vec<String>,
    #[serde(default)]
    pub ai_optimizations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

/// Sales funnel stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFunnel {
    /// Funnel ID (also used as document ID)
    pub id: String,
    /// Owning user
    pub user_id: u64,
    pub funnel_name: String,
    pub description: String,
    /// Template the funnel was created from
    pub target_market: String,
    #[serde(default)]
    pub status: FunnelStatus,
    #[serde(default)]
    pub stages: Vec<FunnelStage>,
    #[serde(default)]
    pub automation_triggers: Vec<String>,
    #[serde(default)]
    pub roi_baseline: Option<RoiBaseline>,
    #[serde(default)]
    pub latest_performance: Option<PerformanceRecord>,
    #[serde(default)]
    pub total_investment: f64,
    #[serde(default)]
    pub generated_revenue: f64,
    /// ROI in percent
    #[serde(default)]
    pub calculated_roi: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl SalesFunnel {
    pub fn is_owned_by(&self, user_id: u64) -> bool {
        self.user_id == user_id
    }
}
