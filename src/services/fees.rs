// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Standardized metrics and performance-fee math.
//!
//! Everything here is pure: platform snapshots go in, standardized metrics,
//! improvement figures and fee breakdowns come out. Persistence lives in
//! [`crate::services::roi`].

use crate::models::metrics::{PlatformSnapshot, StandardizedMetrics};
use crate::models::roi::{
    AovBonus, ConversionBonus, FeeBreakdown, FeeCalculation, FeeCap, Improvements,
    MetricImprovement, PerformanceTargets, RevenueFee, TierTargets,
};

/// Percent improvement a metric must exceed before it counts as improved.
pub const MIN_IMPROVEMENT_PERCENT: f64 = 5.0;

/// Fees never exceed this share of current-period revenue.
pub const FEE_CAP: f64 = 0.15;

/// Share of revenue assumed to be spent on acquiring customers.
const ACQUISITION_SPEND_SHARE: f64 = 0.20;

/// Share of Shopify revenue assumed to be operating cost.
const SHOPIFY_OPERATING_COST_SHARE: f64 = 0.30;

/// Multiplier from average order value to customer lifetime value.
const LIFETIME_VALUE_MULTIPLIER: f64 = 2.5;

/// Estimated customer acquisition cost.
pub fn estimate_cac(revenue: f64, customers: u64) -> f64 {
    if customers == 0 {
        return 0.0;
    }
    revenue * ACQUISITION_SPEND_SHARE / customers as f64
}

/// Estimated cost per lead, assuming a fixed marketing spend capped at $25/lead.
pub fn estimate_cost_per_lead(leads: u64) -> f64 {
    if leads == 0 {
        return 0.0;
    }
    (1000.0 / leads as f64).min(25.0)
}

/// Map a platform snapshot onto the platform-independent metric set.
pub fn standardize(snapshot: &PlatformSnapshot) -> StandardizedMetrics {
    let mut m = StandardizedMetrics::default();

    match snapshot {
        PlatformSnapshot::Shopify {
            metrics,
            baseline_data,
            ..
        } => {
            m.total_revenue = metrics.total_revenue;
            m.total_transactions = metrics.total_orders;
            m.conversion_rate = baseline_data.conversion_rate;
            m.average_order_value = metrics.average_order_value;
            m.total_leads = metrics.total_orders + metrics.abandoned_checkouts;
            m.customer_acquisition_cost = estimate_cac(metrics.total_revenue, metrics.total_orders);
            m.operational_costs = metrics.total_revenue * SHOPIFY_OPERATING_COST_SHARE;
        }
        PlatformSnapshot::HubSpot {
            metrics,
            baseline_data,
            ..
        } => {
            m.total_revenue = metrics.total_revenue;
            m.total_transactions = metrics.closed_won_deals;
            m.conversion_rate = baseline_data.deal_close_rate;
            m.average_order_value = metrics.average_deal_value;
            m.total_leads = metrics.total_contacts;
            m.cost_per_lead = estimate_cost_per_lead(metrics.total_contacts);
            m.customer_acquisition_cost =
                estimate_cac(metrics.total_revenue, metrics.closed_won_deals);
        }
        PlatformSnapshot::GoogleAnalytics {
            metrics,
            baseline_data,
            ..
        } => {
            m.total_revenue = metrics.total_revenue;
            m.total_transactions = metrics.total_conversions;
            m.conversion_rate = baseline_data.conversion_rate;
            m.average_order_value =
                metrics.total_revenue / metrics.total_conversions.max(1) as f64;
            m.total_leads = metrics.total_sessions;
            m.cost_per_lead = estimate_cost_per_lead(metrics.total_sessions);
            m.customer_acquisition_cost =
                estimate_cac(metrics.total_revenue, metrics.total_conversions);
        }
    }

    if m.operational_costs > 0.0 {
        m.roi_percentage = (m.total_revenue - m.operational_costs) / m.operational_costs * 100.0;
    }
    if m.total_transactions > 0 {
        m.lifetime_value = m.average_order_value * LIFETIME_VALUE_MULTIPLIER;
    }

    m
}

fn scaled(baseline: f64, tier_1: f64, tier_2: f64, tier_3: f64) -> TierTargets {
    TierTargets {
        tier_1: baseline * tier_1,
        tier_2: baseline * tier_2,
        tier_3: baseline * tier_3,
        baseline,
    }
}

/// Tiered improvement targets derived from a baseline.
pub fn performance_targets(baseline: &StandardizedMetrics) -> PerformanceTargets {
    let roi = baseline.roi_percentage;
    PerformanceTargets {
        revenue: scaled(baseline.total_revenue, 1.10, 1.25, 1.50),
        conversion_rate: scaled(baseline.conversion_rate, 1.15, 1.30, 1.50),
        average_order_value: scaled(baseline.average_order_value, 1.10, 1.20, 1.35),
        // ROI targets are additive percentage points
        roi_percentage: TierTargets {
            tier_1: roi + 15.0,
            tier_2: roi + 30.0,
            tier_3: roi + 50.0,
            baseline: roi,
        },
    }
}

fn improvement(baseline: f64, current: f64) -> MetricImprovement {
    if baseline > 0.0 {
        let absolute_change = current - baseline;
        let percentage = absolute_change / baseline * 100.0;
        MetricImprovement {
            baseline,
            current,
            absolute_change,
            percentage,
            improved: percentage > MIN_IMPROVEMENT_PERCENT,
        }
    } else {
        MetricImprovement {
            baseline,
            current,
            absolute_change: current,
            percentage: 0.0,
            improved: false,
        }
    }
}

/// Compare current-period metrics against the baseline.
pub fn calculate_improvements(
    baseline: &StandardizedMetrics,
    current: &StandardizedMetrics,
) -> Improvements {
    Improvements {
        total_revenue: improvement(baseline.total_revenue, current.total_revenue),
        conversion_rate: improvement(baseline.conversion_rate, current.conversion_rate),
        average_order_value: improvement(
            baseline.average_order_value,
            current.average_order_value,
        ),
        roi_percentage: improvement(baseline.roi_percentage, current.roi_percentage),
    }
}

/// Round half away from zero to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Performance fee for one period: revenue share plus capped bonuses.
pub fn tiered_fees(
    improvements: &Improvements,
    current: &StandardizedMetrics,
    fee_rate: f64,
) -> FeeCalculation {
    let mut breakdown = FeeBreakdown::default();
    let mut total = 0.0;
    let current_revenue = current.total_revenue;

    let revenue = &improvements.total_revenue;
    if revenue.improved {
        let incremental_revenue = revenue.absolute_change.max(0.0);
        let fee_amount = incremental_revenue * fee_rate;
        total += fee_amount;
        breakdown.revenue_fee = Some(RevenueFee {
            incremental_revenue,
            fee_rate,
            fee_amount,
            improvement_percentage: revenue.percentage,
        });
    }

    let conversion = &improvements.conversion_rate;
    if conversion.improved && conversion.percentage > 15.0 {
        let bonus_rate = ((conversion.percentage - 15.0) * 0.001).min(0.02);
        let bonus_amount = current_revenue * bonus_rate;
        total += bonus_amount;
        breakdown.conversion_bonus = Some(ConversionBonus {
            improvement_percentage: conversion.percentage,
            bonus_rate,
            bonus_amount,
            applied_to_revenue: current_revenue,
        });
    }

    let aov = &improvements.average_order_value;
    if aov.improved && aov.percentage > 10.0 {
        let bonus_rate = ((aov.percentage - 10.0) * 0.0005).min(0.01);
        let bonus_amount = current_revenue * bonus_rate;
        total += bonus_amount;
        breakdown.aov_bonus = Some(AovBonus {
            improvement_percentage: aov.percentage,
            bonus_rate,
            bonus_amount,
        });
    }

    let cap = current_revenue * FEE_CAP;
    if current_revenue > 0.0 && total > cap {
        breakdown.fee_cap_applied = Some(FeeCap {
            calculated_fees: total,
            capped_fees: cap,
            cap_percentage: FEE_CAP,
        });
        total = cap;
    }

    FeeCalculation {
        total_fees: round_cents(total),
        breakdown,
        fee_qualifying: total > 0.0,
    }
}
