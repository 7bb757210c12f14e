// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform performance snapshots and the standardized metric set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;

/// Third-party platforms with a native connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Platform {
    #[serde(rename = "shopify")]
    Shopify,
    #[serde(rename = "hubspot")]
    HubSpot,
    #[serde(rename = "google_analytics")]
    GoogleAnalytics,
}

impl Platform {
    pub const ALL: [Platform; 3] = [
        Platform::Shopify,
        Platform::HubSpot,
        Platform::GoogleAnalytics,
    ];

    /// Wire name, also used in usage-tracking action names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
            Platform::HubSpot => "hubspot",
            Platform::GoogleAnalytics => "google_analytics",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Shopify => "Shopify",
            Platform::HubSpot => "HubSpot",
            Platform::GoogleAnalytics => "Google Analytics 4",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == lowered)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported platform: {}", s)))
    }
}

fn default_period_days() -> u32 {
    30
}

// ─── Shopify ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifyMetrics {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
    /// Percent of checkouts that were abandoned
    pub cart_abandonment_rate: f64,
    pub total_products: u64,
    pub abandoned_checkouts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifyRates {
    pub conversion_rate: f64,
    pub revenue_per_visitor: f64,
    pub checkout_completion_rate: f64,
}

// ─── HubSpot ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSpotMetrics {
    pub total_deals: u64,
    pub closed_won_deals: u64,
    pub total_revenue: f64,
    pub average_deal_value: f64,
    pub total_contacts: u64,
    pub mql_count: u64,
    pub sql_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSpotRates {
    pub deal_close_rate: f64,
    pub contact_to_mql_rate: f64,
    pub mql_to_sql_rate: f64,
    pub sql_to_customer_rate: f64,
}

// ─── Google Analytics ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsMetrics {
    pub total_sessions: u64,
    pub total_users: u64,
    pub total_pageviews: u64,
    pub total_conversions: u64,
    pub total_revenue: f64,
    pub avg_bounce_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsRates {
    pub conversion_rate: f64,
    pub revenue_per_session: f64,
    pub pages_per_session: f64,
    pub bounce_rate: f64,
}

/// Performance data for one period, as pulled from (or posted for) a platform.
///
/// Serialized with a `platform` tag:
/// `{"platform": "shopify", "period_days": 30, "metrics": {..}, "baseline_data": {..}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform")]
pub enum PlatformSnapshot {
    #[serde(rename = "shopify")]
    Shopify {
        #[serde(default = "default_period_days")]
        period_days: u32,
        #[serde(default)]
        metrics: ShopifyMetrics,
        #[serde(default)]
        baseline_data: ShopifyRates,
    },
    #[serde(rename = "hubspot")]
    HubSpot {
        #[serde(default = "default_period_days")]
        period_days: u32,
        #[serde(default)]
        metrics: HubSpotMetrics,
        #[serde(default)]
        baseline_data: HubSpotRates,
    },
    #[serde(rename = "google_analytics")]
    GoogleAnalytics {
        #[serde(default = "default_period_days")]
        period_days: u32,
        #[serde(default)]
        metrics: AnalyticsMetrics,
        #[serde(default)]
        baseline_data: AnalyticsRates,
    },
}

impl PlatformSnapshot {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformSnapshot::Shopify { .. } => Platform::Shopify,
            PlatformSnapshot::HubSpot { .. } => Platform::HubSpot,
            PlatformSnapshot::GoogleAnalytics { .. } => Platform::GoogleAnalytics,
        }
    }

    pub fn period_days(&self) -> u32 {
        match self {
            PlatformSnapshot::Shopify { period_days, .. }
            | PlatformSnapshot::HubSpot { period_days, .. }
            | PlatformSnapshot::GoogleAnalytics { period_days, .. } => *period_days,
        }
    }

    /// Parse a snapshot from a JSON body, filling in `platform` when absent.
    pub fn from_value_or_platform(
        mut value: serde_json::Value,
        fallback: Platform,
    ) -> Result<Self, AppError> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| AppError::BadRequest("Expected a JSON object".to_string()))?;

        let has_platform = object
            .get("platform")
            .is_some_and(|p| !p.is_null() && p.as_str() != Some(""));
        if has_platform {
            // Accept any casing, as the path parameter does
            if let Some(raw) = object.get("platform").and_then(|p| p.as_str()) {
                let platform: Platform = raw.parse()?;
                object.insert("platform".to_string(), platform.as_str().into());
            }
        } else {
            object.insert("platform".to_string(), fallback.as_str().into());
        }

        Self::from_value(value)
    }

    /// Parse a snapshot from a JSON body that must carry its own `platform` tag.
    pub fn from_value(value: serde_json::Value) -> Result<Self, AppError> {
        serde_json::from_value(value)
            .map_err(|e| AppError::BadRequest(format!("Invalid platform data: {}", e)))
    }
}

/// Platform-independent metric set used for ROI and fee calculations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct StandardizedMetrics {
    pub total_revenue: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_transactions: u64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_leads: u64,
    pub cost_per_lead: f64,
    pub customer_acquisition_cost: f64,
    pub lifetime_value: f64,
    pub roi_percentage: f64,
    pub operational_costs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn platform_parse_is_case_insensitive() {
        assert_eq!("Shopify".parse::<Platform>().unwrap(), Platform::Shopify);
        assert_eq!("HUBSPOT".parse::<Platform>().unwrap(), Platform::HubSpot);
        assert_eq!(
            " google_analytics ".parse::<Platform>().unwrap(),
            Platform::GoogleAnalytics
        );
    }

    #[test]
    fn platform_parse_rejects_unknown() {
        let err = "salesforce".parse::<Platform>().unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Unsupported platform: salesforce"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn snapshot_defaults_missing_fields() {
        let snapshot: PlatformSnapshot = serde_json::from_value(json!({
            "platform": "hubspot",
            "metrics": { "total_revenue": 1200.0, "closed_won_deals": 3 }
        }))
        .unwrap();

        assert_eq!(snapshot.platform(), Platform::HubSpot);
        assert_eq!(snapshot.period_days(), 30);
        match snapshot {
            PlatformSnapshot::HubSpot {
                metrics,
                baseline_data,
                ..
            } => {
                assert_eq!(metrics.closed_won_deals, 3);
                assert_eq!(metrics.total_contacts, 0);
                assert_eq!(baseline_data, HubSpotRates::default());
            }
            other => panic!("unexpected snapshot: {other:?}"),
        }
    }

    #[test]
    fn snapshot_uses_fallback_platform() {
        let snapshot = PlatformSnapshot::from_value_or_platform(
            json!({ "metrics": { "total_orders": 4, "total_revenue": 400.0 } }),
            Platform::Shopify,
        )
        .unwrap();

        assert_eq!(snapshot.platform(), Platform::Shopify);
    }

    #[test]
    fn snapshot_explicit_platform_wins_over_fallback() {
        let snapshot = PlatformSnapshot::from_value_or_platform(
            json!({ "platform": "Google_Analytics", "period_days": 7 }),
            Platform::Shopify,
        )
        .unwrap();

        assert_eq!(snapshot.platform(), Platform::GoogleAnalytics);
        assert_eq!(snapshot.period_days(), 7);
    }

    #[test]
    fn snapshot_rejects_non_object() {
        assert!(PlatformSnapshot::from_value_or_platform(json!([1, 2]), Platform::Shopify).is_err());
    }
}
