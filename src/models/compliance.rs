//! Compliance audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// On-page SEO signals extracted from one rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    pub url: String,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub h1_count: usize,
    pub word_count: usize,
    pub internal_links_count: usize,
    pub has_viewport: bool,
    pub has_schema: bool,
    pub images_missing_alt: usize,
    /// Image URLs flagged by filename extension only (jpg/jpeg/png).
    pub large_images: Vec<String>,
    pub uses_modern_format: bool,
    pub robots_txt_found: bool,
    pub sitemap_found: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Good,
    #[serde(rename = "Needs Fix")]
    NeedsFix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
}

/// One evaluated check in the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub title: String,
    pub status: CheckStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub checks: Vec<CheckResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub label: String,
    pub fix: String,
    pub priority: Priority,
}

/// Site-wide result of folding every page's signals through the check battery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub seo_score: String,
    pub passed_checks: u32,
    pub total_checks: u32,
    pub categories: Vec<CategoryResult>,
    pub action_items: Vec<ActionItem>,
}

/// Persisted compliance result for a (chatbot, base URL) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRecord {
    pub chatbot_id: String,
    pub base_url: String,
    pub seo_score: Option<String>,
    pub passed_checks: u32,
    pub total_checks: u32,
    pub categories: Vec<CategoryResult>,
    pub action_items: Vec<ActionItem>,
    /// Last time the base URL was (re)registered.
    pub configured_at: DateTime<Utc>,
    /// Last successful audit; `None` until the first run completes.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ComplianceRecord {
    /// Create an empty record for a freshly registered base URL.
    pub fn new(chatbot_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            chatbot_id: chatbot_id.into(),
            base_url: base_url.into(),
            seo_score: None,
            passed_checks: 0,
            total_checks: 0,
            categories: Vec::new(),
            action_items: Vec::new(),
            configured_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn apply(&mut self, summary: ComplianceSummary, now: DateTime<Utc>) {
        self.seo_score = Some(summary.seo_score);
        self.passed_checks = summary.passed_checks;
        self.total_checks = summary.total_checks;
        self.categories = summary.categories;
        self.action_items = summary.action_items;
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_serializes_like_dashboard_expects() {
        assert_eq!(
            serde_json::to_string(&CheckStatus::NeedsFix).unwrap(),
            "\"Needs Fix\""
        );
        assert_eq!(serde_json::to_string(&CheckStatus::Good).unwrap(), "\"Good\"");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ComplianceRecord::new("bot-1", "https://example.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["chatbotId"], "bot-1");
        assert_eq!(json["baseUrl"], "https://example.com");
        assert!(json["seoScore"].is_null());
        assert!(json["updatedAt"].is_null());
    }

    #[test]
    fn test_apply_summary_sets_updated_at() {
        let mut record = ComplianceRecord::new("bot-1", "https://example.com");
        let now = Utc::now();
        record.apply(
            ComplianceSummary {
                seo_score: "67%".into(),
                passed_checks: 10,
                total_checks: 15,
                categories: Vec::new(),
                action_items: Vec::new(),
            },
            now,
        );
        assert_eq!(record.seo_score.as_deref(), Some("67%"));
        assert_eq!(record.updated_at, Some(now));
    }
}
