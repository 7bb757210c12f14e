// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Analytics 4 Data API connector.
//!
//! GA4 exposes no per-person data, so "leads" are aggregated conversion
//! events, and there are no webhooks to register.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{check_response, check_response_json, ConnectionInfo, Connector, LeadImport, WebhookSetup};
use crate::error::AppError;
use crate::models::lead::ConversionEvent;
use crate::models::metrics::{AnalyticsMetrics, AnalyticsRates, Platform, PlatformSnapshot};

const DEFAULT_BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Order of metrics requested for historical reports.
const HISTORICAL_METRICS: [&str; 6] = [
    "sessions",
    "totalUsers",
    "screenPageViews",
    "bounceRate",
    "conversions",
    "totalRevenue",
];

/// GA4 connector for one property.
#[derive(Clone)]
pub struct GoogleAnalyticsConnector {
    http: reqwest::Client,
    base_url: String,
    property_id: String,
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RunReportResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportRow {
    #[serde(default, rename = "dimensionValues")]
    dimension_values: Vec<ReportValue>,
    #[serde(default, rename = "metricValues")]
    metric_values: Vec<ReportValue>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportValue {
    #[serde(default)]
    value: String,
}

impl ReportRow {
    fn dimension(&self, index: usize) -> &str {
        self.dimension_values
            .get(index)
            .map(|v| v.value.as_str())
            .unwrap_or("")
    }

    /// Metric value as a float; GA4 sends all values as strings.
    fn metric(&self, index: usize) -> f64 {
        self.metric_values
            .get(index)
            .and_then(|v| v.value.trim().parse().ok())
            .unwrap_or(0.0)
    }

    fn count(&self, index: usize) -> u64 {
        self.metric(index).max(0.0) as u64
    }
}

fn date_range_body(days: u32) -> serde_json::Value {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(i64::from(days));
    serde_json::json!([{
        "startDate": start.format("%Y-%m-%d").to_string(),
        "endDate": end.format("%Y-%m-%d").to_string(),
    }])
}

fn named(names: &[&str]) -> Vec<serde_json::Value> {
    names
        .iter()
        .map(|n| serde_json::json!({ "name": n }))
        .collect()
}

/// Sum report rows into a snapshot.
pub(crate) fn summarize(report: &RunReportResponse, days: u32) -> PlatformSnapshot {
    let mut metrics = AnalyticsMetrics::default();
    let mut bounce_total = 0.0;

    for row in &report.rows {
        metrics.total_sessions += row.count(0);
        metrics.total_users += row.count(1);
        metrics.total_pageviews += row.count(2);
        bounce_total += row.metric(3);
        metrics.total_conversions += row.count(4);
        metrics.total_revenue += row.metric(5);
    }

    if !report.rows.is_empty() {
        metrics.avg_bounce_rate = bounce_total / report.rows.len() as f64;
    }

    let sessions = metrics.total_sessions.max(1) as f64;
    let baseline_data = AnalyticsRates {
        conversion_rate: metrics.total_conversions as f64 / sessions * 100.0,
        revenue_per_session: metrics.total_revenue / sessions,
        pages_per_session: metrics.total_pageviews as f64 / sessions,
        bounce_rate: metrics.avg_bounce_rate,
    };

    PlatformSnapshot::GoogleAnalytics {
        period_days: days,
        metrics,
        baseline_data,
    }
}

/// Purchase and lead events from an event-name report.
pub(crate) fn conversion_events(report: &RunReportResponse) -> Vec<ConversionEvent> {
    report
        .rows
        .iter()
        .filter(|row| {
            let name = row.dimension(0).to_lowercase();
            name.contains("purchase") || name.contains("lead")
        })
        .map(|row| ConversionEvent {
            event_name: row.dimension(0).to_string(),
            source: row.dimension(1).to_string(),
            medium: row.dimension(2).to_string(),
            conversions: row.count(0),
            revenue: row.metric(1),
        })
        .collect()
}

impl GoogleAnalyticsConnector {
    pub fn new(http: reqwest::Client, property_id: String, access_token: String) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            property_id,
            access_token,
        }
    }

    /// Point the connector at a different API root (tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn run_report(&self, body: &serde_json::Value) -> Result<reqwest::Response, AppError> {
        let url = format!("{}/properties/{}:runReport", self.base_url, self.property_id);
        self.http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::PlatformApi(e.to_string()))
    }
}

#[async_trait]
impl Connector for GoogleAnalyticsConnector {
    fn platform(&self) -> Platform {
        Platform::GoogleAnalytics
    }

    async fn authenticate(&self) -> Result<ConnectionInfo, AppError> {
        let url = format!("{}/properties/{}/metadata", self.base_url, self.property_id);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::PlatformApi(e.to_string()))?;
        check_response(response).await?;

        Ok(ConnectionInfo::GoogleAnalytics {
            property_id: self.property_id.clone(),
            access_type: "read".to_string(),
        })
    }

    async fn historical_data(&self, days: u32) -> Result<PlatformSnapshot, AppError> {
        let body = serde_json::json!({
            "dateRanges": date_range_body(days),
            "metrics": named(&HISTORICAL_METRICS),
            "dimensions": named(&["date", "sessionSource", "sessionMedium"]),
        });

        let report: RunReportResponse = check_response_json(self.run_report(&body).await?).await?;
        tracing::info!(days, rows = report.rows.len(), "Fetched GA4 historical data");

        Ok(summarize(&report, days))
    }

    async fn fetch_leads(&self, _funnel_id: &str, days: u32) -> Result<LeadImport, AppError> {
        let body = serde_json::json!({
            "dateRanges": date_range_body(days),
            "metrics": named(&["conversions", "totalRevenue"]),
            "dimensions": named(&["eventName", "sessionSource", "sessionMedium"]),
        });

        let response = self.run_report(&body).await?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "GA4 conversion report failed");
            return Ok(LeadImport::ConversionEvents(Vec::new()));
        }

        let report: RunReportResponse = response
            .json()
            .await
            .map_err(|e| AppError::PlatformApi(format!("JSON parse error: {}", e)))?;

        Ok(LeadImport::ConversionEvents(conversion_events(&report)))
    }

    async fn setup_webhooks(&self, _funnel_id: &str) -> Result<WebhookSetup, AppError> {
        Ok(WebhookSetup {
            success: true,
            message: Some(
                "Google Analytics uses the measurement protocol for real-time data; no webhooks are registered."
                    .to_string(),
            ),
            ..Default::default()
        })
    }
}
