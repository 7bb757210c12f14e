// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ROI baselines and performance-fee tracking for funnels.
//!
//! The math lives in [`crate::services::fees`]; this service loads and
//! stores the funnel around it.

use chrono::Utc;
use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::roi::FeeBreakdown;
use crate::models::{
    Improvements, PerformanceRecord, PerformanceTargets, Platform, PlatformSnapshot, RoiBaseline,
    StandardizedMetrics,
};
use crate::services::fees;
use crate::services::funnels::owned_funnel;
use crate::services::SubscriptionService;

/// Response for a newly established baseline.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineSummary {
    pub funnel_id: String,
    pub platform: Platform,
    pub baseline_metrics: StandardizedMetrics,
    pub performance_targets: PerformanceTargets,
    pub baseline_revenue: f64,
    pub baseline_conversion_rate: f64,
}

/// Response for a performance-fee calculation.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub funnel_id: String,
    pub baseline_revenue: f64,
    pub current_revenue: f64,
    /// Revenue change in percent
    pub revenue_improvement: f64,
    pub total_fees: f64,
    pub fee_qualifying: bool,
    pub fee_breakdown: FeeBreakdown,
    pub fee_rate: f64,
    pub improvements: Improvements,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineOverview {
    pub platform: Platform,
    pub calculation_date: String,
    pub period_days: u32,
    pub revenue: f64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentOverview {
    pub calculation_date: String,
    pub revenue: f64,
    pub conversion_rate: f64,
    pub total_fees_due: f64,
    pub fee_rate: f64,
    pub improvements: Improvements,
}

/// ROI dashboard data for one funnel.
#[derive(Debug, Clone, Serialize)]
pub struct RoiSummary {
    pub funnel_id: String,
    pub funnel_name: String,
    pub baseline_established: bool,
    pub performance_tracking_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentOverview>,
}

/// ROI service.
#[derive(Clone)]
pub struct RoiService {
    db: FirestoreDb,
    subscriptions: SubscriptionService,
}

impl RoiService {
    pub fn new(db: FirestoreDb, subscriptions: SubscriptionService) -> Self {
        Self { db, subscriptions }
    }

    /// Store `snapshot` as the funnel's ROI baseline.
    pub async fn establish_baseline(
        &self,
        user_id: u64,
        funnel_id: &str,
        snapshot: PlatformSnapshot,
    ) -> Result<BaselineSummary, AppError> {
        let mut funnel = owned_funnel(&self.db, user_id, funnel_id).await?;

        let metrics = fees::standardize(&snapshot);
        let targets = fees::performance_targets(&metrics);
        let platform = snapshot.platform();
        let now = Utc::now().to_rfc3339();

        funnel.total_investment = metrics.operational_costs;
        funnel.generated_revenue = metrics.total_revenue;
        funnel.calculated_roi = metrics.roi_percentage;
        funnel.roi_baseline = Some(RoiBaseline {
            platform,
            calculation_date: now.clone(),
            period_days: snapshot.period_days(),
            baseline_metrics: metrics.clone(),
            raw_snapshot: snapshot,
            performance_targets: targets.clone(),
            fee_calculation_ready: true,
        });
        funnel.updated_at = now;

        self.db.upsert_funnel(&funnel).await?;

        tracing::info!(
            user_id,
            funnel_id,
            platform = %platform,
            revenue = metrics.total_revenue,
            "ROI baseline established"
        );

        Ok(BaselineSummary {
            funnel_id: funnel.id,
            platform,
            baseline_revenue: metrics.total_revenue,
            baseline_conversion_rate: metrics.conversion_rate,
            baseline_metrics: metrics,
            performance_targets: targets,
        })
    }

    /// Compare a current period against the baseline and compute fees.
    ///
    /// `current_period` may omit `platform`; it defaults to the baseline's.
    pub async fn calculate_performance(
        &self,
        user_id: u64,
        funnel_id: &str,
        current_period: serde_json::Value,
    ) -> Result<PerformanceSummary, AppError> {
        let mut funnel = owned_funnel(&self.db, user_id, funnel_id).await?;

        let baseline = funnel.roi_baseline.as_ref().ok_or_else(|| {
            AppError::BadRequest(
                "No ROI baseline found. Please import baseline data first.".to_string(),
            )
        })?;

        let snapshot = PlatformSnapshot::from_value_or_platform(current_period, baseline.platform)?;
        let plan = self.subscriptions.get_plan(user_id).await?;
        let fee_rate = plan.performance_fee_rate();

        let baseline_metrics = baseline.baseline_metrics.clone();
        let current = fees::standardize(&snapshot);
        let improvements = fees::calculate_improvements(&baseline_metrics, &current);
        let fee_calculation = fees::tiered_fees(&improvements, &current, fee_rate);
        let now = Utc::now().to_rfc3339();

        funnel.generated_revenue = current.total_revenue;
        funnel.calculated_roi = current.roi_percentage;
        funnel.latest_performance = Some(PerformanceRecord {
            calculation_date: now.clone(),
            baseline_metrics: baseline_metrics.clone(),
            current_metrics: current.clone(),
            improvements: improvements.clone(),
            fee_calculation: fee_calculation.clone(),
            fee_rate_applied: fee_rate,
            plan,
        });
        funnel.updated_at = now;

        self.db.upsert_funnel(&funnel).await?;

        tracing::info!(
            user_id,
            funnel_id,
            total_fees = fee_calculation.total_fees,
            fee_rate,
            "Performance fee calculated"
        );

        Ok(PerformanceSummary {
            funnel_id: funnel.id,
            baseline_revenue: baseline_metrics.total_revenue,
            current_revenue: current.total_revenue,
            revenue_improvement: improvements.total_revenue.percentage,
            total_fees: fee_calculation.total_fees,
            fee_qualifying: fee_calculation.fee_qualifying,
            fee_breakdown: fee_calculation.breakdown,
            fee_rate,
            improvements,
        })
    }

    pub async fn summary(&self, user_id: u64, funnel_id: &str) -> Result<RoiSummary, AppError> {
        let funnel = owned_funnel(&self.db, user_id, funnel_id).await?;

        let baseline = funnel.roi_baseline.as_ref().map(|b| BaselineOverview {
            platform: b.platform,
            calculation_date: b.calculation_date.clone(),
            period_days: b.period_days,
            revenue: b.baseline_metrics.total_revenue,
            conversion_rate: b.baseline_metrics.conversion_rate,
            average_order_value: b.baseline_metrics.average_order_value,
        });

        let current = funnel.latest_performance.as_ref().map(|p| CurrentOverview {
            calculation_date: p.calculation_date.clone(),
            revenue: p.current_metrics.total_revenue,
            conversion_rate: p.current_metrics.conversion_rate,
            total_fees_due: p.fee_calculation.total_fees,
            fee_rate: p.fee_rate_applied,
            improvements: p.improvements.clone(),
        });

        Ok(RoiSummary {
            funnel_id: funnel.id.clone(),
            funnel_name: funnel.funnel_name.clone(),
            baseline_established: baseline.is_some(),
            performance_tracking_active: current.is_some(),
            baseline,
            current,
        })
    }
}
