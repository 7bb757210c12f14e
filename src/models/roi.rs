// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ROI baseline, improvement and performance-fee records.
//!
//! These are stored on the funnel document so a fee calculation can always
//! be traced back to the baseline it was measured against.

use serde::{Deserialize, Serialize};

use crate::models::metrics::{Platform, PlatformSnapshot, StandardizedMetrics};
use crate::models::subscription::Plan;

/// Improvement thresholds for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTargets {
    pub tier_1: f64,
    pub tier_2: f64,
    pub tier_3: f64,
    pub baseline: f64,
}

/// Tiered targets for the four fee-relevant metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTargets {
    pub revenue: TierTargets,
    pub conversion_rate: TierTargets,
    pub average_order_value: TierTargets,
    pub roi_percentage: TierTargets,
}

/// Baseline captured from imported platform data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiBaseline {
    pub platform: Platform,
    /// When the baseline was calculated (RFC3339)
    pub calculation_date: String,
    pub period_days: u32,
    pub baseline_metrics: StandardizedMetrics,
    /// The platform data the baseline was derived from
    pub raw_snapshot: PlatformSnapshot,
    pub performance_targets: PerformanceTargets,
    pub fee_calculation_ready: bool,
}

/// Change in one metric between baseline and current period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricImprovement {
    pub baseline: f64,
    pub current: f64,
    pub absolute_change: f64,
    /// Percent change relative to the baseline (0 when baseline is 0)
    pub percentage: f64,
    /// Whether the change clears the minimum improvement threshold
    pub improved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvements {
    pub total_revenue: MetricImprovement,
    pub conversion_rate: MetricImprovement,
    pub average_order_value: MetricImprovement,
    pub roi_percentage: MetricImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueFee {
    pub incremental_revenue: f64,
    pub fee_rate: f64,
    pub fee_amount: f64,
    pub improvement_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionBonus {
    pub improvement_percentage: f64,
    pub bonus_rate: f64,
    pub bonus_amount: f64,
    pub applied_to_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AovBonus {
    pub improvement_percentage: f64,
    pub bonus_rate: f64,
    pub bonus_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCap {
    pub calculated_fees: f64,
    pub capped_fees: f64,
    pub cap_percentage: f64,
}

/// Components that contributed to a fee; absent components did not apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_fee: Option<RevenueFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_bonus: Option<ConversionBonus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aov_bonus: Option<AovBonus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_cap_applied: Option<FeeCap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculation {
    /// Total fee, rounded to cents
    pub total_fees: f64,
    pub breakdown: FeeBreakdown,
    pub fee_qualifying: bool,
}

/// Most recent performance-fee calculation for a funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub calculation_date: String,
    pub baseline_metrics: StandardizedMetrics,
    pub current_metrics: StandardizedMetrics,
    pub improvements: Improvements,
    pub fee_calculation: FeeCalculation,
    pub fee_rate_applied: f64,
    pub plan: Plan,
}
