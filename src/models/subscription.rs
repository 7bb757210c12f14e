// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription plans, usage records and limit checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing plan. Determines the performance-fee rate and usage limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    /// Share of incremental revenue charged as a performance fee.
    pub fn performance_fee_rate(&self) -> f64 {
        match self {
            Plan::Starter => 0.05,
            Plan::Professional => 0.07,
            Plan::Enterprise => 0.10,
        }
    }

    /// Maximum usage for a resource, `None` when unlimited.
    pub fn limit(&self, resource: UsageResource) -> Option<u32> {
        match (self, resource) {
            (Plan::Starter, UsageResource::SalesFunnels) => Some(3),
            (Plan::Professional, UsageResource::SalesFunnels) => Some(10),
            (Plan::Starter, UsageResource::ApiCalls) => Some(1_000),
            (Plan::Professional, UsageResource::ApiCalls) => Some(10_000),
            (Plan::Enterprise, _) => None,
        }
    }

    /// Decide whether one more unit of `resource` may be consumed.
    pub fn check(&self, resource: UsageResource, current: u32) -> UsageCheck {
        let limit = self.limit(resource);
        match limit {
            Some(max) if current >= max => UsageCheck {
                allowed: false,
                reason: Some(format!(
                    "{} plan limit reached: {}/{} {}",
                    self.display_name(),
                    current,
                    max,
                    resource.as_str()
                )),
                upgrade_required: *self != Plan::Enterprise,
                current,
                limit,
            },
            _ => UsageCheck {
                allowed: true,
                reason: None,
                upgrade_required: false,
                current,
                limit,
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Professional => "Professional",
            Plan::Enterprise => "Enterprise",
        }
    }
}

/// Metered resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageResource {
    SalesFunnels,
    ApiCalls,
}

impl UsageResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageResource::SalesFunnels => "sales_funnels",
            UsageResource::ApiCalls => "api_calls",
        }
    }
}

impl fmt::Display for UsageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    PastDue,
    Cancelled,
}

/// Subscription document, written by the billing platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Owner (also used as document ID)
    pub user_id: u64,
    pub plan: Plan,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub started_at: String,
}

impl Subscription {
    /// Plan in effect: lapsed subscriptions fall back to Starter.
    pub fn effective_plan(&self) -> Plan {
        match self.status {
            SubscriptionStatus::Active => self.plan,
            _ => Plan::Starter,
        }
    }
}

/// One metered action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: u64,
    pub resource: UsageResource,
    /// e.g. `shopify_import_leads` or a funnel ID
    pub action: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// RFC3339 timestamp
    pub recorded_at: String,
}

/// Outcome of a usage limit check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub upgrade_required: bool,
    pub current: u32,
    pub limit: Option<u32>,
}
