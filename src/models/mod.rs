// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod funnel;
pub mod lead;
pub mod metrics;
pub mod roi;
pub mod subscription;
pub mod template;

pub use connection::PlatformConnection;
pub use funnel::{FunnelStage, FunnelStatus, SalesFunnel};
pub use lead::{ConversionEvent, Lead, LeadStage, QualificationStatus};
pub use metrics::{Platform, PlatformSnapshot, StandardizedMetrics};
pub use roi::{FeeCalculation, Improvements, PerformanceRecord, PerformanceTargets, RoiBaseline};
pub use subscription::{Plan, Subscription, UsageCheck, UsageRecord, UsageResource};
pub use template::{TemplatePreview, TemplateRecommendation, VerticalTemplate};
