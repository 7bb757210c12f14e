// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Third-party platform connectors.
//!
//! Each platform implements [`Connector`]. Connectors are built per request
//! from decrypted credentials and are cheap to construct; the underlying
//! `reqwest::Client` is shared.

pub mod google_analytics;
pub mod hubspot;
pub mod shopify;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::lead::{ConversionEvent, Lead};
use crate::models::metrics::{Platform, PlatformSnapshot};

pub use google_analytics::GoogleAnalyticsConnector;
pub use hubspot::HubSpotConnector;
pub use shopify::ShopifyConnector;

/// Longest Shopify shop subdomain we accept.
const MAX_SHOP_DOMAIN_LEN: usize = 63;

/// Credentials supplied by the user when connecting a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCredentials {
    pub access_token: String,
    /// Shopify shop subdomain (`{shop}.myshopify.com`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_domain: Option<String>,
    /// GA4 numeric property ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
}

impl PlatformCredentials {
    /// Check that the fields `platform` needs are present and well formed.
    ///
    /// The shop domain and property ID end up in request URLs, so they are
    /// restricted to characters that cannot redirect the request elsewhere.
    pub fn validate_for(&self, platform: Platform) -> Result<(), AppError> {
        if self.access_token.trim().is_empty() {
            return Err(AppError::BadRequest("access_token is required".to_string()));
        }

        match platform {
            Platform::Shopify => {
                let shop = self.shop_domain.as_deref().unwrap_or("");
                if shop.is_empty() {
                    return Err(AppError::BadRequest(
                        "shop_domain is required for Shopify".to_string(),
                    ));
                }
                if shop.len() > MAX_SHOP_DOMAIN_LEN
                    || !shop.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    return Err(AppError::BadRequest(format!(
                        "Invalid shop_domain: {}",
                        shop
                    )));
                }
            }
            Platform::GoogleAnalytics => {
                let property = self.property_id.as_deref().unwrap_or("");
                if property.is_empty() || !property.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AppError::BadRequest(
                        "property_id must be a numeric GA4 property ID".to_string(),
                    ));
                }
            }
            Platform::HubSpot => {}
        }

        Ok(())
    }
}

/// Account details returned by a successful authentication check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform")]
pub enum ConnectionInfo {
    #[serde(rename = "shopify")]
    Shopify {
        shop_name: String,
        domain: String,
        currency: String,
        plan: String,
    },
    #[serde(rename = "hubspot")]
    HubSpot {
        portal_id: Option<u64>,
        currency: Option<String>,
        timezone: Option<String>,
    },
    #[serde(rename = "google_analytics")]
    GoogleAnalytics {
        property_id: String,
        access_type: String,
    },
}

/// Result of pulling leads from a platform.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadImport {
    Leads(Vec<Lead>),
    /// Platforms without per-person data report aggregated conversions
    ConversionEvents(Vec<ConversionEvent>),
}

impl LeadImport {
    pub fn len(&self) -> usize {
        match self {
            LeadImport::Leads(leads) => leads.len(),
            LeadImport::ConversionEvents(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of registering real-time webhooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookSetup {
    pub success: bool,
    pub webhooks_created: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhooks: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Events the platform can deliver once its app is configured
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A platform integration.
#[async_trait]
pub trait Connector: Send + Sync {
    fn platform(&self) -> Platform;

    /// Verify the credentials by fetching account details.
    async fn authenticate(&self) -> Result<ConnectionInfo, AppError>;

    /// Performance over the last `days` days.
    async fn historical_data(&self, days: u32) -> Result<PlatformSnapshot, AppError>;

    /// Leads created in the last `days` days, attributed to `funnel_id`.
    async fn fetch_leads(&self, funnel_id: &str, days: u32) -> Result<LeadImport, AppError>;

    /// Register webhooks that deliver new activity for `funnel_id`.
    async fn setup_webhooks(&self, funnel_id: &str) -> Result<WebhookSetup, AppError>;
}

/// Base URL overrides, used to point connectors at a mock server.
#[derive(Debug, Clone, Default)]
pub struct ConnectorEndpoints {
    pub shopify: Option<String>,
    pub hubspot: Option<String>,
    pub google_analytics: Option<String>,
}

/// Build the connector for `platform` after validating its credentials.
pub fn build_connector(
    platform: Platform,
    http: reqwest::Client,
    credentials: PlatformCredentials,
    webhook_domain: &str,
    endpoints: &ConnectorEndpoints,
) -> Result<Box<dyn Connector>, AppError> {
    credentials.validate_for(platform)?;

    let connector: Box<dyn Connector> = match platform {
        Platform::Shopify => {
            let shop = credentials.shop_domain.clone().unwrap_or_default();
            let mut c = ShopifyConnector::new(
                http,
                &shop,
                credentials.access_token,
                webhook_domain.to_string(),
            );
            if let Some(base) = &endpoints.shopify {
                c = c.with_base_url(base.clone());
            }
            Box::new(c)
        }
        Platform::HubSpot => {
            let mut c = HubSpotConnector::new(http, credentials.access_token);
            if let Some(base) = &endpoints.hubspot {
                c = c.with_base_url(base.clone());
            }
            Box::new(c)
        }
        Platform::GoogleAnalytics => {
            let property = credentials.property_id.clone().unwrap_or_default();
            let mut c = GoogleAnalyticsConnector::new(http, property, credentials.access_token);
            if let Some(base) = &endpoints.google_analytics {
                c = c.with_base_url(base.clone());
            }
            Box::new(c)
        }
    };

    Ok(connector)
}

/// Capabilities advertised for a platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    pub platform: Platform,
    pub name: &'static str,
    pub description: &'static str,
    pub capabilities: &'static [&'static str],
    pub ideal_for: &'static [&'static str],
}

/// Platforms with a native connector.
pub fn supported_platforms() -> Vec<PlatformSummary> {
    vec![
        PlatformSummary {
            platform: Platform::Shopify,
            name: Platform::Shopify.display_name(),
            description: "E-commerce platform for DTC brands",
            capabilities: &["orders", "customers", "products", "analytics", "webhooks"],
            ideal_for: &["DTC E-commerce", "Online Retail"],
        },
        PlatformSummary {
            platform: Platform::HubSpot,
            name: Platform::HubSpot.display_name(),
            description: "CRM and marketing automation platform",
            capabilities: &["contacts", "deals", "pipeline", "analytics", "webhooks"],
            ideal_for: &["B2B SaaS", "Professional Services", "Marketing Agencies"],
        },
        PlatformSummary {
            platform: Platform::GoogleAnalytics,
            name: Platform::GoogleAnalytics.display_name(),
            description: "Web analytics and conversion tracking",
            capabilities: &["traffic", "conversions", "revenue", "user_behavior"],
            ideal_for: &["All Industries", "Website Optimization"],
        },
    ]
}

/// Map a non-success platform response to an error.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!("Platform rate limit hit (429)");
        return Err(AppError::PlatformApi(AppError::PLATFORM_RATE_LIMIT.to_string()));
    }

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(AppError::PlatformApi(AppError::PLATFORM_AUTH_ERROR.to_string()));
    }

    Err(AppError::PlatformApi(format!("HTTP {}: {}", status, body)))
}

/// Check the response and parse its JSON body.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::PlatformApi(format!("JSON parse error: {}", e)))
}

/// Numeric field that platforms send either as a number or a string.
pub(crate) fn lenient_f64(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds(shop: Option<&str>, property: Option<&str>) -> PlatformCredentials {
        PlatformCredentials {
            access_token: "token".to_string(),
            shop_domain: shop.map(str::to_string),
            property_id: property.map(str::to_string),
        }
    }

    #[test]
    fn shopify_requires_clean_shop_domain() {
        assert!(creds(Some("acme-store"), None)
            .validate_for(Platform::Shopify)
            .is_ok());
        assert!(creds(None, None).validate_for(Platform::Shopify).is_err());
        assert!(creds(Some("evil.com/x"), None)
            .validate_for(Platform::Shopify)
            .is_err());
        assert!(creds(Some(&"a".repeat(64)), None)
            .validate_for(Platform::Shopify)
            .is_err());
    }

    #[test]
    fn analytics_requires_numeric_property() {
        assert!(creds(None, Some("123456"))
            .validate_for(Platform::GoogleAnalytics)
            .is_ok());
        assert!(creds(None, Some("12/../34"))
            .validate_for(Platform::GoogleAnalytics)
            .is_err());
        assert!(creds(None, None)
            .validate_for(Platform::GoogleAnalytics)
            .is_err());
    }

    #[test]
    fn empty_token_rejected() {
        let mut c = creds(None, None);
        c.access_token = "  ".to_string();
        assert!(c.validate_for(Platform::HubSpot).is_err());
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(lenient_f64(Some(&json!("19.99"))), 19.99);
        assert_eq!(lenient_f64(Some(&json!(5))), 5.0);
        assert_eq!(lenient_f64(Some(&json!(null))), 0.0);
        assert_eq!(lenient_f64(None), 0.0);
    }

    #[test]
    fn supported_platforms_lists_all() {
        let platforms: Vec<Platform> = supported_platforms().iter().map(|p| p.platform).collect();
        assert_eq!(platforms, Platform::ALL.to_vec());
    }
}
