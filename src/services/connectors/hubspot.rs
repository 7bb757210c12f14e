// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HubSpot CRM connector.
//!
//! Deals drive revenue metrics; contacts drive lead counts and the
//! MQL/SQL funnel rates. CRM list endpoints are cursor-paginated.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use super::{check_response_json, lenient_f64, ConnectionInfo, Connector, LeadImport, WebhookSetup};
use crate::error::AppError;
use crate::models::lead::{normalize_email, Lead, LeadStage, QualificationStatus};
use crate::models::metrics::{HubSpotMetrics, HubSpotRates, Platform, PlatformSnapshot};

const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

/// Page size for CRM list calls (HubSpot maximum).
const PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched per object type.
const MAX_PAGES: usize = 10;

const DEAL_PROPERTIES: &str = "amount,dealstage,createdate,closedate,dealname,pipeline";
const CONTACT_PROPERTIES: &str =
    "email,phone,company,industry,createdate,lifecyclestage,lead_status,hs_analytics_source";

/// Events HubSpot can deliver once the app subscription is configured.
pub const AVAILABLE_EVENTS: [&str; 4] = [
    "contact.creation",
    "contact.propertyChange",
    "deal.creation",
    "deal.propertyChange",
];

/// HubSpot connector for one portal.
#[derive(Clone)]
pub struct HubSpotConnector {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccountDetails {
    #[serde(rename = "portalId")]
    portal_id: Option<u64>,
    #[serde(rename = "currencyCode")]
    currency_code: Option<String>,
    #[serde(rename = "timeZone")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: String,
}

/// CRM object (deal or contact) with its requested properties.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmObject {
    pub id: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// One entry of a webhook delivery; HubSpot batches events in an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub subscription_type: String,
    #[serde(default)]
    pub object_id: u64,
    pub property_name: Option<String>,
    pub property_value: Option<String>,
}

impl WebhookEvent {
    /// A deal moved to the closed-won stage.
    pub fn is_deal_won(&self) -> bool {
        self.subscription_type == "deal.propertyChange"
            && self.property_name.as_deref() == Some("dealstage")
            && self.property_value.as_deref() == Some("closedwon")
    }
}

impl CrmObject {
    /// Non-empty string property.
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    fn created_at(&self) -> Option<Result<DateTime<Utc>, chrono::ParseError>> {
        self.prop("createdate")
            .map(|s| DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc)))
    }

    /// Created within `[start, end]`; objects with a missing or unparseable
    /// create date are excluded.
    fn created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        matches!(self.created_at(), Some(Ok(d)) if start <= d && d <= end)
    }
}

impl HubSpotConnector {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
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
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::PlatformApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// Fetch up to `MAX_PAGES` pages of a CRM object type.
    async fn list_objects(&self, object: &str, properties: &str) -> Result<Vec<CrmObject>, AppError> {
        let path = format!("/crm/v3/objects/{}", object);
        let mut objects = Vec::new();
        let mut after: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("properties", properties.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ];
            if let Some(cursor) = after.take() {
                query.push(("after", cursor));
            }

            let page: Page<CrmObject> = self.get_json(&path, &query).await?;
            objects.extend(page.results);

            match page.paging.and_then(|p| p.next) {
                Some(next) => after = Some(next.after),
                None => break,
            }
        }

        Ok(objects)
    }

    /// Fetch a single contact, used when a webhook reports a new contact.
    pub async fn get_contact(&self, contact_id: &str) -> Result<CrmObject, AppError> {
        let path = format!(
            "/crm/v3/objects/contacts/{}",
            urlencoding::encode(contact_id)
        );
        self.get_json(&path, &[("properties", CONTACT_PROPERTIES.to_string())])
            .await
    }
}

/// Map a contact to a lead using its lifecycle stage.
pub fn contact_to_lead(funnel_id: &str, contact: &CrmObject, now: &str) -> Option<Lead> {
    let email = contact.prop("email")?;
    let lifecycle = contact.prop("lifecyclestage").unwrap_or("lead");

    let (stage, qualified, score, converted) = match lifecycle {
        "customer" => (LeadStage::Customer, true, 100, true),
        "salesqualifiedlead" => (LeadStage::Qualified, true, 80, false),
        "marketingqualifiedlead" => (LeadStage::MarketingQualified, true, 60, false),
        _ => (LeadStage::Lead, false, 20, false),
    };

    Some(Lead {
        funnel_id: funnel_id.to_string(),
        email: normalize_email(email),
        phone: contact.prop("phone").map(str::to_string),
        company: contact.prop("company").map(str::to_string),
        industry: contact.prop("industry").map(str::to_string),
        lead_source: contact
            .prop("hs_analytics_source")
            .unwrap_or("HubSpot")
            .to_string(),
        current_stage: stage,
        qualification_status: if qualified {
            QualificationStatus::Qualified
        } else {
            QualificationStatus::Unqualified
        },
        lead_score: score,
        converted_to_customer: converted,
        platform_data: serde_json::json!({
            "hubspot_id": contact.id,
            "lifecycle_stage": lifecycle,
            "lead_status": contact.prop("lead_status"),
            "created_at": contact.prop("createdate"),
        }),
        created_at: now.to_string(),
    })
}

fn rate(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator.max(1) as f64 * 100.0
}

/// Aggregate deals and contacts created in the window into a snapshot.
fn summarize(
    deals: &[CrmObject],
    contacts: &[CrmObject],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    days: u32,
) -> PlatformSnapshot {
    let deals: Vec<&CrmObject> = deals.iter().filter(|d| d.created_between(start, end)).collect();
    let contacts: Vec<&CrmObject> = contacts
        .iter()
        .filter(|c| c.created_between(start, end))
        .collect();

    let won: Vec<&&CrmObject> = deals
        .iter()
        .filter(|d| d.prop("dealstage") == Some("closedwon"))
        .collect();
    let total_revenue: f64 = won
        .iter()
        .map(|d| lenient_f64(d.properties.get("amount")))
        .sum();
    let average_deal_value = if won.is_empty() {
        0.0
    } else {
        total_revenue / won.len() as f64
    };

    let lifecycle_count = |stage: &str| {
        contacts
            .iter()
            .filter(|c| c.prop("lifecyclestage") == Some(stage))
            .count()
    };
    let mql = lifecycle_count("marketingqualifiedlead");
    let sql = lifecycle_count("salesqualifiedlead");

    PlatformSnapshot::HubSpot {
        period_days: days,
        metrics: HubSpotMetrics {
            total_deals: deals.len() as u64,
            closed_won_deals: won.len() as u64,
            total_revenue,
            average_deal_value,
            total_contacts: contacts.len() as u64,
            mql_count: mql as u64,
            sql_count: sql as u64,
        },
        baseline_data: HubSpotRates {
            deal_close_rate: rate(won.len(), deals.len()),
            contact_to_mql_rate: rate(mql, contacts.len()),
            mql_to_sql_rate: rate(sql, mql),
            sql_to_customer_rate: rate(won.len(), sql),
        },
    }
}

#[async_trait]
impl Connector for HubSpotConnector {
    fn platform(&self) -> Platform {
        Platform::HubSpot
    }

    async fn authenticate(&self) -> Result<ConnectionInfo, AppError> {
        let details: AccountDetails = self.get_json("/account-info/v3/details", &[]).await?;
        Ok(ConnectionInfo::HubSpot {
            portal_id: details.portal_id,
            currency: details.currency_code,
            timezone: details.time_zone,
        })
    }

    async fn historical_data(&self, days: u32) -> Result<PlatformSnapshot, AppError> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));

        let deals = self.list_objects("deals", DEAL_PROPERTIES).await?;
        let contacts = match self.list_objects("contacts", CONTACT_PROPERTIES).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "HubSpot contacts fetch failed");
                Vec::new()
            }
        };

        tracing::info!(
            days,
            deals = deals.len(),
            contacts = contacts.len(),
            "Fetched HubSpot historical data"
        );

        Ok(summarize(&deals, &contacts, start, end, days))
    }

    async fn fetch_leads(&self, funnel_id: &str, days: u32) -> Result<LeadImport, AppError> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));
        let contacts = self.list_objects("contacts", CONTACT_PROPERTIES).await?;

        let now = end.to_rfc3339();
        let leads = contacts
            .iter()
            .filter(|c| match c.created_at() {
                // Contacts with no create date are kept
                None => true,
                Some(Ok(d)) => start <= d && d <= end,
                Some(Err(_)) => false,
            })
            .filter_map(|c| contact_to_lead(funnel_id, c, &now))
            .collect();

        Ok(LeadImport::Leads(leads))
    }

    async fn setup_webhooks(&self, _funnel_id: &str) -> Result<WebhookSetup, AppError> {
        // Subscriptions are configured on the HubSpot app, not per portal
        Ok(WebhookSetup {
            success: true,
            message: Some(
                "HubSpot webhook setup completed. Real-time sync will be available once the app is configured."
                    .to_string(),
            ),
            available: AVAILABLE_EVENTS.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        })
    }
}
