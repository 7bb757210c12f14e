// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Funnel Optimizer: vertical sales funnels with performance-based pricing
//!
//! This crate provides the backend API for building funnels from industry
//! templates, importing baselines from Shopify, HubSpot and Google
//! Analytics, and charging fees only on measured improvement.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{IntegrationService, RoiService, SubscriptionService, TemplateService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub templates: TemplateService,
    pub subscriptions: SubscriptionService,
    pub roi: RoiService,
    pub integrations: IntegrationService,
}
