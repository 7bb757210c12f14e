// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopify Admin API connector.
//!
//! Handles:
//! - Shop details for connection checks
//! - Orders, products and abandoned checkouts for baseline metrics
//! - Customers as leads
//! - Webhook registration for real-time sync

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use super::{check_response_json, lenient_f64, ConnectionInfo, Connector, LeadImport, WebhookSetup};
use crate::error::AppError;
use crate::models::lead::{normalize_email, Lead, LeadStage, QualificationStatus};
use crate::models::metrics::{Platform, PlatformSnapshot, ShopifyMetrics, ShopifyRates};

const API_VERSION: &str = "2023-10";

/// Topics registered for every funnel.
pub const WEBHOOK_TOPICS: [&str; 3] = ["orders/create", "customers/create", "checkouts/create"];

/// Lead source recorded for Shopify leads.
pub const LEAD_SOURCE: &str = "Shopify";

/// Shopify connector for one shop.
#[derive(Clone)]
pub struct ShopifyConnector {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    webhook_domain: String,
}

impl ShopifyConnector {
    pub fn new(
        http: reqwest::Client,
        shop_domain: &str,
        access_token: String,
        webhook_domain: String,
    ) -> Self {
        Self {
            http,
            base_url: format!("https://{}.myshopify.com/admin/api/{}", shop_domain, API_VERSION),
            access_token,
            webhook_domain,
        }
    }

    /// Point the connector at a different API root (tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("X-Shopify-Access-Token", &self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::PlatformApi(e.to_string()))?;

        check_response_json(response).await
    }

    fn webhook_address(&self, funnel_id: &str, topic: &str) -> String {
        format!(
            "https://{}/api/webhooks/shopify/{}/{}",
            self.webhook_domain, funnel_id, topic
        )
    }
}

fn created_range(days: u32) -> Vec<(&'static str, String)> {
    let end = Utc::now();
    let start = end - Duration::days(i64::from(days));
    vec![
        ("created_at_min", start.to_rfc3339()),
        ("created_at_max", end.to_rfc3339()),
    ]
}

#[derive(Debug, Deserialize)]
struct ShopResponse {
    shop: Shop,
}

#[derive(Debug, Deserialize)]
struct Shop {
    name: String,
    domain: String,
    currency: String,
    plan_name: String,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    #[serde(default)]
    orders: Vec<ShopifyOrder>,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CheckoutsResponse {
    #[serde(default)]
    checkouts: Vec<ShopifyCheckout>,
}

#[derive(Debug, Deserialize)]
struct CustomersResponse {
    #[serde(default)]
    customers: Vec<ShopifyCustomer>,
}

/// Customer as sent by the REST API and the `customers/create` webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCustomer {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub total_spent: serde_json::Value,
    pub created_at: Option<String>,
}

/// Order as sent by the REST API and the `orders/create` webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    pub email: Option<String>,
    #[serde(default)]
    pub total_price: serde_json::Value,
    pub customer: Option<ShopifyCustomer>,
}

impl ShopifyOrder {
    pub fn total_price(&self) -> f64 {
        lenient_f64(Some(&self.total_price))
    }

    /// Buyer email from the order or its customer record.
    pub fn buyer_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.customer.as_ref().and_then(|c| c.email.as_deref()))
            .filter(|e| !e.trim().is_empty())
    }
}

/// Checkout as sent by the REST API and the `checkouts/create` webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCheckout {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<String>,
}

/// Map a customer to a lead; customers without an email are skipped.
pub fn customer_to_lead(funnel_id: &str, customer: &ShopifyCustomer, now: &str) -> Option<Lead> {
    let email = customer.email.as_deref().filter(|e| !e.trim().is_empty())?;
    let has_orders = customer.orders_count > 0;

    Some(Lead {
        funnel_id: funnel_id.to_string(),
        email: normalize_email(email),
        phone: customer.phone.clone(),
        company: None,
        industry: None,
        lead_source: LEAD_SOURCE.to_string(),
        current_stage: if has_orders {
            LeadStage::Customer
        } else {
            LeadStage::Prospect
        },
        qualification_status: if has_orders {
            QualificationStatus::Qualified
        } else {
            QualificationStatus::Unqualified
        },
        lead_score: customer.orders_count.saturating_mul(20).min(100) as u32,
        converted_to_customer: has_orders,
        platform_data: serde_json::json!({
            "total_spent": customer.total_spent,
            "orders_count": customer.orders_count,
            "created_at": customer.created_at,
        }),
        created_at: now.to_string(),
    })
}

/// Map a started checkout to a prospect lead.
pub fn checkout_to_lead(funnel_id: &str, checkout: &ShopifyCheckout, now: &str) -> Option<Lead> {
    let email = checkout.email.as_deref().filter(|e| !e.trim().is_empty())?;

    Some(Lead {
        funnel_id: funnel_id.to_string(),
        email: normalize_email(email),
        phone: checkout.phone.clone(),
        company: None,
        industry: None,
        lead_source: LEAD_SOURCE.to_string(),
        current_stage: LeadStage::Prospect,
        qualification_status: QualificationStatus::Unqualified,
        lead_score: 10,
        converted_to_customer: false,
        platform_data: serde_json::json!({ "checkout_created_at": checkout.created_at }),
        created_at: now.to_string(),
    })
}

/// Map a placed order to a converted customer lead.
pub fn order_to_lead(funnel_id: &str, order: &ShopifyOrder, now: &str) -> Option<Lead> {
    let email = order.buyer_email()?;

    Some(Lead {
        funnel_id: funnel_id.to_string(),
        email: normalize_email(email),
        phone: order.customer.as_ref().and_then(|c| c.phone.clone()),
        company: None,
        industry: None,
        lead_source: LEAD_SOURCE.to_string(),
        current_stage: LeadStage::Customer,
        qualification_status: QualificationStatus::Qualified,
        lead_score: 100,
        converted_to_customer: true,
        platform_data: serde_json::json!({ "last_order_total": order.total_price() }),
        created_at: now.to_string(),
    })
}

#[async_trait]
impl Connector for ShopifyConnector {
    fn platform(&self) -> Platform {
        Platform::Shopify
    }

    async fn authenticate(&self) -> Result<ConnectionInfo, AppError> {
        let response: ShopResponse = self.get_json("/shop.json", &[]).await?;
        Ok(ConnectionInfo::Shopify {
            shop_name: response.shop.name,
            domain: response.shop.domain,
            currency: response.shop.currency,
            plan: response.shop.plan_name,
        })
    }

    async fn historical_data(&self, days: u32) -> Result<PlatformSnapshot, AppError> {
        let mut range = created_range(days);

        let mut order_query = range.clone();
        order_query.push(("status", "any".to_string()));
        order_query.push(("limit", "250".to_string()));
        let orders: OrdersResponse = self.get_json("/orders.json", &order_query).await?;

        // Products and checkouts are optional scopes; treat failures as empty
        let total_products = match self
            .get_json::<ProductsResponse>("/products.json", &[("limit", "50".to_string())])
            .await
        {
            Ok(r) => r.products.len() as u64,
            Err(e) => {
                tracing::warn!(error = %e, "Shopify products fetch failed");
                0
            }
        };

        range.push(("limit", "250".to_string()));
        let abandoned_checkouts = match self
            .get_json::<CheckoutsResponse>("/checkouts.json", &range)
            .await
        {
            Ok(r) => r.checkouts.len() as u64,
            Err(e) => {
                tracing::warn!(error = %e, "Shopify checkouts fetch failed");
                0
            }
        };

        let total_orders = orders.orders.len() as u64;
        let total_revenue: f64 = orders.orders.iter().map(ShopifyOrder::total_price).sum();
        let average_order_value = if total_orders > 0 {
            total_revenue / total_orders as f64
        } else {
            0.0
        };

        let attempts = abandoned_checkouts + total_orders;
        let cart_abandonment_rate = if attempts > 0 {
            abandoned_checkouts as f64 / attempts as f64 * 100.0
        } else {
            0.0
        };
        let completion_rate = total_orders as f64 / attempts.max(1) as f64 * 100.0;

        tracing::info!(days, total_orders, "Fetched Shopify historical data");

        Ok(PlatformSnapshot::Shopify {
            period_days: days,
            metrics: ShopifyMetrics {
                total_orders,
                total_revenue,
                average_order_value,
                cart_abandonment_rate,
                total_products,
                abandoned_checkouts,
            },
            baseline_data: ShopifyRates {
                conversion_rate: completion_rate,
                revenue_per_visitor: total_revenue / attempts.max(1) as f64,
                checkout_completion_rate: completion_rate,
            },
        })
    }

    async fn fetch_leads(&self, funnel_id: &str, days: u32) -> Result<LeadImport, AppError> {
        let mut query = created_range(days);
        query.push(("limit", "250".to_string()));
        let response: CustomersResponse = self.get_json("/customers.json", &query).await?;

        let now = Utc::now().to_rfc3339();
        let leads = response
            .customers
            .iter()
            .filter_map(|c| customer_to_lead(funnel_id, c, &now))
            .collect();

        Ok(LeadImport::Leads(leads))
    }

    async fn setup_webhooks(&self, funnel_id: &str) -> Result<WebhookSetup, AppError> {
        let url = format!("{}/webhooks.json", self.base_url);
        let mut created = Vec::new();

        for topic in WEBHOOK_TOPICS {
            let body = serde_json::json!({
                "webhook": {
                    "topic": topic,
                    "address": self.webhook_address(funnel_id, topic),
                    "format": "json",
                }
            });

            let response = self
                .http
                .post(&url)
                .header("X-Shopify-Access-Token", &self.access_token)
                .json(&body)
                .send()
                .await
                .map_err(|e| AppError::PlatformApi(e.to_string()))?;

            if response.status() == reqwest::StatusCode::CREATED {
                let mut payload: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| AppError::PlatformApi(format!("JSON parse error: {}", e)))?;
                created.push(
                    payload
                        .get_mut("webhook")
                        .map(serde_json::Value::take)
                        .unwrap_or_default(),
                );
                tracing::info!(funnel_id, topic, "Created Shopify webhook");
            } else {
                tracing::warn!(
                    funnel_id,
                    topic,
                    status = %response.status(),
                    "Shopify webhook not created"
                );
            }
        }

        if created.is_empty() {
            return Ok(WebhookSetup {
                success: false,
                error: Some("Shopify rejected every webhook registration".to_string()),
                ..Default::default()
            });
        }

        Ok(WebhookSetup {
            success: true,
            webhooks_created: created.len(),
            webhooks: created,
            ..Default::default()
        })
    }
}
