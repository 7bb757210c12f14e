// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod connectors;
pub mod fees;
pub mod funnels;
pub mod integration;
pub mod kms;
pub mod roi;
pub mod subscription;
pub mod templates;
pub mod webhook_signature;

pub use integration::IntegrationService;
pub use kms::KmsService;
pub use roi::RoiService;
pub use subscription::SubscriptionService;
pub use templates::TemplateService;
