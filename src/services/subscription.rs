// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan lookup, usage limits and usage tracking.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::subscription::SubscriptionStatus;
use crate::models::{Plan, UsageCheck, UsageRecord, UsageResource};

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    pub current: u32,
    pub limit: Option<u32>,
}

/// Summary returned by `GET /api/subscription`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOverview {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub performance_fee_rate: f64,
    pub sales_funnels: ResourceUsage,
    pub api_calls: ResourceUsage,
}

/// Subscription and usage service.
#[derive(Clone)]
pub struct SubscriptionService {
    db: FirestoreDb,
}

/// Start of the current UTC calendar month (RFC3339).
fn month_start() -> String {
    let now = Utc::now();
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc().to_rfc3339())
        .unwrap_or_else(|| now.to_rfc3339())
}

impl SubscriptionService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Plan in effect for a user; no subscription means Starter.
    pub async fn get_plan(&self, user_id: u64) -> Result<Plan, AppError> {
        Ok(self
            .db
            .get_subscription(user_id)
            .await?
            .map(|s| s.effective_plan())
            .unwrap_or_default())
    }

    async fn current_usage(&self, user_id: u64, resource: UsageResource) -> Result<u32, AppError> {
        match resource {
            UsageResource::SalesFunnels => self.db.count_funnels_for_user(user_id).await,
            UsageResource::ApiCalls => {
                self.db
                    .count_usage_since(user_id, resource, &month_start())
                    .await
            }
        }
    }

    /// Whether the user may consume one more unit of `resource`.
    pub async fn check_usage_limits(
        &self,
        user_id: u64,
        resource: UsageResource,
    ) -> Result<UsageCheck, AppError> {
        let plan = self.get_plan(user_id).await?;

        // Unlimited plans skip the count entirely
        if plan.limit(resource).is_none() {
            return Ok(plan.check(resource, 0));
        }

        let current = self.current_usage(user_id, resource).await?;
        Ok(plan.check(resource, current))
    }

    /// Like [`Self::check_usage_limits`] but turns a denial into an error.
    pub async fn require_within_limits(
        &self,
        user_id: u64,
        resource: UsageResource,
    ) -> Result<(), AppError> {
        let check = self.check_usage_limits(user_id, resource).await?;
        if check.allowed {
            return Ok(());
        }

        tracing::info!(
            user_id,
            resource = %resource,
            current = check.current,
            "Usage limit reached"
        );
        Err(AppError::UsageLimit {
            reason: check.reason.unwrap_or_default(),
            upgrade_required: check.upgrade_required,
        })
    }

    /// Record one unit of usage. Failures are logged, never returned.
    pub async fn track_usage(
        &self,
        user_id: u64,
        resource: UsageResource,
        action: &str,
        metadata: serde_json::Value,
    ) {
        let record = UsageRecord {
            user_id,
            resource,
            action: action.to_string(),
            metadata,
            recorded_at: Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.db.record_usage(&record).await {
            tracing::warn!(user_id, action, error = %e, "Failed to track usage");
        }
    }

    pub async fn overview(&self, user_id: u64) -> Result<SubscriptionOverview, AppError> {
        let subscription = self.db.get_subscription(user_id).await?;
        let (plan, status) = match &subscription {
            Some(s) => (s.effective_plan(), s.status),
            None => (Plan::default(), SubscriptionStatus::default()),
        };

        let funnels = self.db.count_funnels_for_user(user_id).await?;
        let calls = self
            .db
            .count_usage_since(user_id, UsageResource::ApiCalls, &month_start())
            .await?;

        Ok(SubscriptionOverview {
            plan,
            status,
            performance_fee_rate: plan.performance_fee_rate(),
            sales_funnels: ResourceUsage {
                current: funnels,
                limit: plan.limit(UsageResource::SalesFunnels),
            },
            api_calls: ResourceUsage {
                current: calls,
                limit: plan.limit(UsageResource::ApiCalls),
            },
        })
    }
}
