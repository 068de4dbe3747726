//! Performance audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScore {
    pub performance: u32,
    pub accessibility: u32,
    pub best_practices: u32,
    pub seo: u32,
}

/// Display strings for the core loading metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub fcp: String,
    pub lcp: String,
    pub tti: String,
    pub speed_index: String,
    pub blocking_time: String,
    pub cls: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Pass,
    Fail,
}

impl CheckOutcome {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityChecks {
    pub color_contrast: CheckOutcome,
    /// Percent string, e.g. `"92%"`, or `"N/A"`.
    pub alt_text: String,
    pub keyboard: CheckOutcome,
    pub screen_reader: CheckOutcome,
    pub focus_indicators: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPracticeChecks {
    pub https: CheckOutcome,
    #[serde(rename = "deprecatedAPIs")]
    pub deprecated_apis: u32,
    pub console_errors: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoChecks {
    pub meta_description: CheckOutcome,
    pub title_tag: CheckOutcome,
    pub structured_data: CheckOutcome,
    pub crawlable_links: CheckOutcome,
    pub mobile_friendly: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_savings: String,
    pub impact: String,
    pub effort: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: Option<f64>,
    pub impact: String,
    pub effort: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: Option<f64>,
    pub impact: String,
    pub effort: String,
    pub priority: String,
    pub details: String,
}

/// Findings that are merged across pages by title.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for Opportunity {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Diagnostic {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Recommendation {
    fn title(&self) -> &str {
        &self.title
    }
}

/// Normalized grading result for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePerformance {
    pub url: String,
    pub overall_score: OverallScore,
    pub metrics: Metrics,
    pub accessibility: AccessibilityChecks,
    pub best_practices: BestPracticeChecks,
    pub seo: SeoChecks,
    pub opportunities: Vec<Opportunity>,
    pub diagnostics: Vec<Diagnostic>,
    pub recommendations: Vec<Recommendation>,
}

/// Site-wide averages and merged findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub overall_score: OverallScore,
    pub metrics: Metrics,
    pub accessibility: AccessibilityChecks,
    pub best_practices: BestPracticeChecks,
    pub seo: SeoChecks,
    pub opportunities: Vec<Opportunity>,
    pub diagnostics: Vec<Diagnostic>,
    pub recommendations: Vec<Recommendation>,
}

/// Persisted performance result for a (chatbot, base URL) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub chatbot_id: String,
    pub base_url: String,
    pub overall_score: Option<OverallScore>,
    pub metrics: Option<Metrics>,
    pub accessibility: Option<AccessibilityChecks>,
    pub best_practices: Option<BestPracticeChecks>,
    pub seo: Option<SeoChecks>,
    pub opportunities: Vec<Opportunity>,
    pub diagnostics: Vec<Diagnostic>,
    pub recommendations: Vec<Recommendation>,
    pub configured_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PerformanceRecord {
    pub fn new(chatbot_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            chatbot_id: chatbot_id.into(),
            base_url: base_url.into(),
            overall_score: None,
            metrics: None,
            accessibility: None,
            best_practices: None,
            seo: None,
            opportunities: Vec::new(),
            diagnostics: Vec::new(),
            recommendations: Vec::new(),
            configured_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn apply(&mut self, summary: PerformanceSummary, now: DateTime<Utc>) {
        self.overall_score = Some(summary.overall_score);
        self.metrics = Some(summary.metrics);
        self.accessibility = Some(summary.accessibility);
        self.best_practices = Some(summary.best_practices);
        self.seo = Some(summary.seo);
        self.opportunities = summary.opportunities;
        self.diagnostics = summary.diagnostics;
        self.recommendations = summary.recommendations;
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_practices_field_names() {
        let checks = BestPracticeChecks {
            https: CheckOutcome::Pass,
            deprecated_apis: 2,
            console_errors: 1,
        };
        let json = serde_json::to_value(&checks).unwrap();
        assert_eq!(json["https"], "Pass");
        assert_eq!(json["deprecatedAPIs"], 2);
        assert_eq!(json["consoleErrors"], 1);
    }

    #[test]
    fn test_empty_record_has_no_scores() {
        let record = PerformanceRecord::new("bot", "https://example.com");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["overallScore"].is_null());
        assert_eq!(json["opportunities"], serde_json::json!([]));
    }
}
