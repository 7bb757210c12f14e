// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform integration orchestration.
//!
//! Handles:
//! - Connection tests and baseline imports (historical data, leads, webhooks)
//! - Encrypted credential storage with an in-memory cache
//! - Shopify and HubSpot webhook deliveries

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Lead, Platform, PlatformConnection, PlatformSnapshot, UsageResource};
use crate::services::connectors::hubspot::{contact_to_lead, WebhookEvent};
use crate::services::connectors::shopify::{
    checkout_to_lead, customer_to_lead, order_to_lead, ShopifyCheckout, ShopifyCustomer,
    ShopifyOrder,
};
use crate::services::connectors::{
    build_connector, ConnectionInfo, ConnectorEndpoints, HubSpotConnector, LeadImport,
    PlatformCredentials, WebhookSetup,
};
use crate::services::funnels::owned_funnel;
use crate::services::kms::{decrypt_credentials, encrypt_credentials};
use crate::services::roi::BaselineSummary;
use crate::services::{KmsService, RoiService, SubscriptionService};

/// Largest import window accepted, in days.
pub const MAX_IMPORT_DAYS: u32 = 365;

pub const DEFAULT_IMPORT_DAYS: u32 = 30;

/// Shared cache of decrypted credentials for use in AppState.
pub type CredentialCache = Arc<DashMap<(u64, Platform), PlatformCredentials>>;

/// Result of `POST /api/funnels/{id}/import`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub platform: Platform,
    pub historical_data: PlatformSnapshot,
    pub leads_imported: usize,
    pub webhook_setup: WebhookSetup,
    pub baseline: BaselineSummary,
    pub baseline_established: bool,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    LeadCreated,
    LeadExists,
    OrderRecorded { revenue: f64 },
    Ignored(&'static str),
}

/// Integration service.
#[derive(Clone)]
pub struct IntegrationService {
    db: FirestoreDb,
    kms: Arc<KmsService>,
    subscriptions: SubscriptionService,
    roi: RoiService,
    http: reqwest::Client,
    webhook_domain: String,
    endpoints: ConnectorEndpoints,
    credential_cache: CredentialCache,
}

impl IntegrationService {
    pub fn new(
        db: FirestoreDb,
        kms: Arc<KmsService>,
        subscriptions: SubscriptionService,
        roi: RoiService,
        webhook_domain: String,
    ) -> Self {
        Self {
            db,
            kms,
            subscriptions,
            roi,
            http: reqwest::Client::new(),
            webhook_domain,
            endpoints: ConnectorEndpoints::default(),
            credential_cache: Arc::new(DashMap::new()),
        }
    }

    /// Route platform API calls to other base URLs (tests).
    pub fn with_endpoints(mut self, endpoints: ConnectorEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Verify credentials against the platform.
    pub async fn test_connection(
        &self,
        user_id: u64,
        platform: Platform,
        credentials: PlatformCredentials,
    ) -> Result<ConnectionInfo, AppError> {
        let connector = build_connector(
            platform,
            self.http.clone(),
            credentials,
            &self.webhook_domain,
            &self.endpoints,
        )?;

        let info = connector.authenticate().await?;

        self.subscriptions
            .track_usage(
                user_id,
                UsageResource::ApiCalls,
                &format!("{}_authenticate", platform),
                serde_json::json!({}),
            )
            .await;

        tracing::info!(user_id, platform = %platform, "Platform connection verified");
        Ok(info)
    }

    /// Pull a platform's history into a funnel and make it the ROI baseline.
    pub async fn import_baseline(
        &self,
        user_id: u64,
        funnel_id: &str,
        platform: Platform,
        credentials: PlatformCredentials,
        days: u32,
    ) -> Result<ImportSummary, AppError> {
        owned_funnel(&self.db, user_id, funnel_id).await?;

        if !(1..=MAX_IMPORT_DAYS).contains(&days) {
            return Err(AppError::BadRequest(format!(
                "days must be between 1 and {}",
                MAX_IMPORT_DAYS
            )));
        }

        self.subscriptions
            .require_within_limits(user_id, UsageResource::ApiCalls)
            .await?;

        let connector = build_connector(
            platform,
            self.http.clone(),
            credentials.clone(),
            &self.webhook_domain,
            &self.endpoints,
        )?;

        let historical = connector.historical_data(days).await;
        self.track_call(user_id, platform, "historical_data", funnel_id)
            .await;
        let historical = historical?;

        let leads_imported = match connector.fetch_leads(funnel_id, days).await {
            Ok(LeadImport::Leads(leads)) => match self.db.insert_leads_if_absent(&leads).await {
                Ok(created) => created,
                Err(e) => {
                    tracing::warn!(funnel_id, platform = %platform, error = %e, "Lead insert failed");
                    0
                }
            },
            // Aggregated events carry no person to store
            Ok(LeadImport::ConversionEvents(events)) => {
                tracing::info!(
                    funnel_id,
                    events = events.len(),
                    "Fetched conversion events"
                );
                0
            }
            Err(e) => {
                tracing::warn!(funnel_id, platform = %platform, error = %e, "Lead fetch failed");
                0
            }
        };
        self.track_call(user_id, platform, "leads", funnel_id).await;

        let webhook_setup = match connector.setup_webhooks(funnel_id).await {
            Ok(setup) => setup,
            Err(e) => {
                tracing::warn!(funnel_id, platform = %platform, error = %e, "Webhook setup failed");
                WebhookSetup {
                    success: false,
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };
        self.track_call(user_id, platform, "webhooks", funnel_id)
            .await;

        self.store_credentials(user_id, platform, &credentials, funnel_id)
            .await?;

        let baseline = self
            .roi
            .establish_baseline(user_id, funnel_id, historical.clone())
            .await?;

        tracing::info!(
            user_id,
            funnel_id,
            platform = %platform,
            leads_imported,
            webhooks_created = webhook_setup.webhooks_created,
            "Baseline import complete"
        );

        Ok(ImportSummary {
            platform,
            historical_data: historical,
            leads_imported,
            webhook_setup,
            baseline,
            baseline_established: true,
        })
    }

    async fn track_call(&self, user_id: u64, platform: Platform, call: &str, funnel_id: &str) {
        self.subscriptions
            .track_usage(
                user_id,
                UsageResource::ApiCalls,
                &format!("{}_{}", platform, call),
                serde_json::json!({ "funnel_id": funnel_id }),
            )
            .await;
    }

    async fn store_credentials(
        &self,
        user_id: u64,
        platform: Platform,
        credentials: &PlatformCredentials,
        funnel_id: &str,
    ) -> Result<(), AppError> {
        let encrypted = encrypt_credentials(&self.kms, user_id, credentials).await?;

        self.db
            .set_connection(&PlatformConnection {
                user_id,
                platform,
                credentials_encrypted: encrypted,
                connected_at: Utc::now().to_rfc3339(),
                last_funnel_id: Some(funnel_id.to_string()),
            })
            .await?;

        self.credential_cache
            .insert((user_id, platform), credentials.clone());
        Ok(())
    }

    /// Stored credentials for a user's platform connection, if any.
    pub async fn credentials_for(
        &self,
        user_id: u64,
        platform: Platform,
    ) -> Result<Option<PlatformCredentials>, AppError> {
        if let Some(cached) = self.credential_cache.get(&(user_id, platform)) {
            return Ok(Some(cached.clone()));
        }

        let Some(connection) = self.db.get_connection(user_id, platform).await? else {
            return Ok(None);
        };

        let credentials =
            decrypt_credentials(&self.kms, user_id, &connection.credentials_encrypted).await?;
        self.credential_cache
            .insert((user_id, platform), credentials.clone());
        Ok(Some(credentials))
    }

    /// Drop a cached credential (e.g. after the platform rejected it).
    pub fn invalidate_credentials(&self, user_id: u64, platform: Platform) {
        self.credential_cache.remove(&(user_id, platform));
    }

    // ─── Webhooks ───────────────────────────────────────────────

    /// Apply a verified Shopify webhook delivery to a funnel.
    pub async fn handle_shopify_webhook(
        &self,
        funnel_id: &str,
        topic: &str,
        body: &[u8],
    ) -> Result<WebhookOutcome, AppError> {
        if self.db.get_funnel(funnel_id).await?.is_none() {
            tracing::warn!(funnel_id, topic, "Shopify webhook for unknown funnel");
            return Ok(WebhookOutcome::Ignored("unknown funnel"));
        }

        let now = Utc::now().to_rfc3339();

        match topic {
            "customers/create" => {
                let customer: ShopifyCustomer = parse_payload(body)?;
                let lead = customer_to_lead(funnel_id, &customer, &now);
                self.insert_webhook_lead(lead, funnel_id, topic).await
            }
            "checkouts/create" => {
                let checkout: ShopifyCheckout = parse_payload(body)?;
                let lead = checkout_to_lead(funnel_id, &checkout, &now);
                self.insert_webhook_lead(lead, funnel_id, topic).await
            }
            "orders/create" => {
                let order: ShopifyOrder = parse_payload(body)?;

                if let Some(lead) = order_to_lead(funnel_id, &order, &now) {
                    self.db.record_order_lead(&lead).await?;
                }

                let revenue = order.total_price();
                if !self.db.add_funnel_revenue(funnel_id, revenue).await? {
                    return Ok(WebhookOutcome::Ignored("unknown funnel"));
                }

                tracing::info!(funnel_id, revenue, "Shopify order recorded");
                Ok(WebhookOutcome::OrderRecorded { revenue })
            }
            _ => {
                tracing::info!(funnel_id, topic, "Ignoring Shopify webhook topic");
                Ok(WebhookOutcome::Ignored("unhandled topic"))
            }
        }
    }

    async fn insert_webhook_lead(
        &self,
        lead: Option<Lead>,
        funnel_id: &str,
        topic: &str,
    ) -> Result<WebhookOutcome, AppError> {
        let Some(lead) = lead else {
            tracing::debug!(funnel_id, topic, "Webhook payload has no email");
            return Ok(WebhookOutcome::Ignored("no email"));
        };

        if self.db.insert_lead_if_absent(&lead).await? {
            tracing::info!(funnel_id, topic, "Lead created from webhook");
            Ok(WebhookOutcome::LeadCreated)
        } else {
            Ok(WebhookOutcome::LeadExists)
        }
    }

    /// Apply a verified batch of HubSpot webhook events to a funnel.
    ///
    /// Per-event failures are logged; the batch is always accepted.
    pub async fn handle_hubspot_events(
        &self,
        funnel_id: &str,
        events: &[WebhookEvent],
    ) -> Result<Vec<WebhookOutcome>, AppError> {
        let Some(funnel) = self.db.get_funnel(funnel_id).await? else {
            tracing::warn!(funnel_id, "HubSpot webhook for unknown funnel");
            return Ok(vec![WebhookOutcome::Ignored("unknown funnel"); events.len()]);
        };

        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            let outcome = match event.subscription_type.as_str() {
                "contact.creation" => {
                    match self.import_hubspot_contact(funnel.user_id, funnel_id, event).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!(
                                funnel_id,
                                contact_id = event.object_id,
                                error = %e,
                                "HubSpot contact import failed"
                            );
                            WebhookOutcome::Ignored("contact import failed")
                        }
                    }
                }
                _ if event.is_deal_won() => {
                    tracing::info!(funnel_id, deal_id = event.object_id, "HubSpot deal won");
                    WebhookOutcome::Ignored("deal won logged")
                }
                _ => WebhookOutcome::Ignored("unhandled event"),
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn import_hubspot_contact(
        &self,
        owner_id: u64,
        funnel_id: &str,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, AppError> {
        let Some(credentials) = self.credentials_for(owner_id, Platform::HubSpot).await? else {
            tracing::warn!(funnel_id, "No stored HubSpot connection for funnel owner");
            return Ok(WebhookOutcome::Ignored("not connected"));
        };

        let mut connector = HubSpotConnector::new(self.http.clone(), credentials.access_token);
        if let Some(base) = &self.endpoints.hubspot {
            connector = connector.with_base_url(base.clone());
        }

        let contact = match connector.get_contact(&event.object_id.to_string()).await {
            Ok(contact) => contact,
            Err(e) => {
                if e.is_platform_auth_error() {
                    self.invalidate_credentials(owner_id, Platform::HubSpot);
                }
                return Err(e);
            }
        };

        let lead = contact_to_lead(funnel_id, &contact, &Utc::now().to_rfc3339());
        self.insert_webhook_lead(lead, funnel_id, "contact.creation")
            .await
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))
}
