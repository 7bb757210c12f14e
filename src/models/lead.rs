// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where a lead currently sits in the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    Lead,
    Prospect,
    MarketingQualified,
    Qualified,
    Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    Qualified,
    Unqualified,
}

/// Lead stored in Firestore, keyed by funnel and email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub funnel_id: String,
    /// Lower-cased email address
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    /// Acquisition source (e.g. "Shopify", "ORGANIC_SEARCH")
    pub lead_source: String,
    pub current_stage: LeadStage,
    pub qualification_status: QualificationStatus,
    /// 0-100
    pub lead_score: u32,
    pub converted_to_customer: bool,
    /// Raw platform fields kept for later scoring
    #[serde(default)]
    pub platform_data: serde_json::Value,
    pub created_at: String,
}

impl Lead {
    /// Firestore document ID; one lead per (funnel, email).
    pub fn document_id(&self) -> String {
        lead_document_id(&self.funnel_id, &self.email)
    }

    /// Fold an order-derived lead into this one.
    ///
    /// The buyer becomes a qualified customer; source, company, industry and
    /// creation time are kept, and order fields are added to `platform_data`.
    pub fn absorb_order(&mut self, order: Lead) {
        self.current_stage = LeadStage::Customer;
        self.qualification_status = QualificationStatus::Qualified;
        self.lead_score = self.lead_score.max(order.lead_score);
        self.converted_to_customer = true;
        if self.phone.is_none() {
            self.phone = order.phone;
        }

        if let serde_json::Value::Object(fields) = order.platform_data {
            if let Some(existing) = self.platform_data.as_object_mut() {
                existing.extend(fields);
            } else {
                self.platform_data = serde_json::Value::Object(fields);
            }
        }
    }
}

/// Document ID for the lead with `email` in `funnel_id`.
pub fn lead_document_id(funnel_id: &str, email: &str) -> String {
    let normalized = normalize_email(email);
    format!("{}_{}", funnel_id, urlencoding::encode(&normalized))
}

/// Canonical form used for de-duplication.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Aggregated GA4 conversion event (GA4 exposes no per-user lead data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub event_name: String,
    pub source: String,
    pub medium: String,
    pub conversions: u64,
    pub revenue: f64,
}
