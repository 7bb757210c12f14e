// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Industry vertical template catalog.
//!
//! Loaded once at startup from a JSON file and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::models::template::{StagePreview, TemplateUsageStats};
use crate::models::{FunnelStatus, SalesFunnel, TemplatePreview, TemplateRecommendation, VerticalTemplate};

/// Number of quick wins quoted in a recommendation's reasons.
const QUICK_WIN_REASONS: usize = 2;

/// Length a quick win is truncated to in recommendation reasons.
const QUICK_WIN_EXCERPT_CHARS: usize = 50;

const ESTIMATED_SETUP_TIME: &str = "15-30 minutes";

/// Recommendations returned by an industry match.
const INDUSTRY_MATCH_COUNT: usize = 3;

#[derive(Deserialize)]
struct Catalog {
    templates: Vec<VerticalTemplate>,
}

/// Usage stats across all templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateStats {
    pub stats: BTreeMap<String, TemplateUsageStats>,
    pub total_users: u32,
}

/// Top recommendations for a business profile.
#[derive(Debug, Clone, Serialize)]
pub struct IndustryMatch {
    pub recommendations: Vec<TemplateRecommendation>,
    pub total_templates: usize,
    /// Echoed back; not used for scoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
}

/// Template catalog in catalog order.
#[derive(Debug, Clone)]
pub struct TemplateService {
    templates: Vec<VerticalTemplate>,
}

impl TemplateService {
    /// Load the catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| TemplateError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load the catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, TemplateError> {
        let catalog: Catalog =
            serde_json::from_str(json_data).map_err(|e| TemplateError::ParseError(e.to_string()))?;

        if catalog.templates.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut seen = HashSet::new();
        for template in &catalog.templates {
            if template.template_id.is_empty() {
                return Err(TemplateError::ParseError("empty template_id".to_string()));
            }
            if !seen.insert(template.template_id.as_str()) {
                return Err(TemplateError::DuplicateId(template.template_id.clone()));
            }
        }

        Ok(Self {
            templates: catalog.templates,
        })
    }

    pub fn templates(&self) -> &[VerticalTemplate] {
        &self.templates
    }

    pub fn get(&self, template_id: &str) -> Option<&VerticalTemplate> {
        self.templates.iter().find(|t| t.template_id == template_id)
    }

    /// Score every template against the user's industry and revenue.
    ///
    /// Sorted by score, highest first; ties keep catalog order.
    pub fn recommendations(
        &self,
        industry: Option<&str>,
        revenue_range: Option<&str>,
    ) -> Vec<TemplateRecommendation> {
        let industry = industry.map(str::trim).filter(|s| !s.is_empty());
        let revenue_range = revenue_range.map(str::trim).filter(|s| !s.is_empty());

        let mut recommendations: Vec<TemplateRecommendation> = self
            .templates
            .iter()
            .map(|t| score_template(t, industry, revenue_range))
            .collect();

        // Stable sort keeps catalog order on ties
        recommendations.sort_by(|a, b| b.score.cmp(&a.score));
        recommendations
    }

    pub fn industry_match(
        &self,
        industry: Option<&str>,
        revenue_range: Option<&str>,
        company_size: Option<&str>,
    ) -> IndustryMatch {
        let mut recommendations = self.recommendations(industry, revenue_range);
        recommendations.truncate(INDUSTRY_MATCH_COUNT);

        IndustryMatch {
            recommendations,
            total_templates: self.templates.len(),
            company_size: company_size.map(str::to_string),
        }
    }

    pub fn preview(&self, template_id: &str) -> Option<TemplatePreview> {
        let template = self.get(template_id)?;

        Some(TemplatePreview {
            name: template.name.clone(),
            description: template.description.clone(),
            stages: template
                .stages
                .iter()
                .map(|s| StagePreview {
                    name: s.name.clone(),
                    description: s.description.clone(),
                    benchmark_conversion: s.benchmark_conversion,
                    key_metrics: s.key_metrics.clone(),
                })
                .collect(),
            benchmark_kpis: template.benchmark_kpis.clone(),
            quick_wins: template.quick_wins.iter().take(3).cloned().collect(),
            total_stages: template.stages.len(),
            estimated_setup_time: ESTIMATED_SETUP_TIME.to_string(),
        })
    }

    pub fn stats(&self) -> TemplateStats {
        TemplateStats {
            stats: self
                .templates
                .iter()
                .map(|t| (t.template_id.clone(), t.usage_stats.clone()))
                .collect(),
            total_users: self.templates.iter().map(|t| t.usage_stats.usage_count).sum(),
        }
    }

    /// Build (but do not store) a new funnel from a template.
    pub fn build_funnel(
        &self,
        user_id: u64,
        template_id: &str,
        custom_name: Option<&str>,
    ) -> Result<SalesFunnel, AppError> {
        let template = self
            .get(template_id)
            .ok_or_else(|| AppError::BadRequest(format!("Template {} not found", template_id)))?;

        let name = custom_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&template.name);
        let now = chrono::Utc::now().to_rfc3339();

        Ok(SalesFunnel {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            funnel_name: name.to_string(),
            description: template.description.clone(),
            target_market: template.template_id.clone(),
            status: FunnelStatus::Active,
            stages: template.stages.clone(),
            automation_triggers: template.automation_triggers.clone(),
            roi_baseline: None,
            latest_performance: None,
            total_investment: 0.0,
            generated_revenue: 0.0,
            calculated_roi: 0.0,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

fn score_template(
    template: &VerticalTemplate,
    industry: Option<&str>,
    revenue_range: Option<&str>,
) -> TemplateRecommendation {
    let mut score = 0;
    let mut reasons = Vec::new();

    if let Some(industry) = industry {
        let lowered = industry.to_lowercase();
        let description = template.description.to_lowercase();

        if template.template_id.to_lowercase().contains(&lowered) {
            score += 50;
            reasons.push(format!("Perfect industry match for {}", industry));
        } else if lowered.split_whitespace().any(|w| description.contains(w)) {
            score += 25;
            reasons.push(format!("Related to {} industry", industry));
        }
    }

    if let Some(revenue) = revenue_range {
        if template.target_revenue_range.contains(revenue) {
            score += 30;
            reasons.push("Revenue range matches your business size".to_string());
        }
    }

    score += template.quick_wins.len() as u32 * 5;
    reasons.extend(template.quick_wins.iter().take(QUICK_WIN_REASONS).map(|win| {
        let excerpt: String = win.chars().take(QUICK_WIN_EXCERPT_CHARS).collect();
        format!("Quick win: {}...", excerpt)
    }));

    TemplateRecommendation {
        template_id: template.template_id.clone(),
        name: template.name.clone(),
        description: template.description.clone(),
        score,
        reasons,
        benchmark_kpis: template.benchmark_kpis.clone(),
        quick_wins_count: template.quick_wins.len(),
        stages_count: template.stages.len(),
    }
}

/// Errors from loading the template catalog.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Template catalog is empty")]
    Empty,

    #[error("Duplicate template id: {0}")]
    DuplicateId(String),
}
