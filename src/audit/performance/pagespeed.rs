//! PageSpeed Insights client and Lighthouse payload normalization.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::PerformanceConfig;
use crate::models::{
    AccessibilityChecks, BestPracticeChecks, CheckOutcome, Diagnostic, Metrics, Opportunity,
    OverallScore, PagePerformance, Recommendation, SeoChecks,
};

/// Lighthouse categories requested for every URL.
pub const CATEGORIES: &[&str] = &["performance", "accessibility", "seo", "best-practices"];

#[derive(Debug, Error)]
pub enum GraderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("grading service returned {0}")]
    Status(u16),
    #[error("malformed grading payload: {0}")]
    Malformed(&'static str),
}

/// External page-performance grading service. One call per URL, no retries.
#[async_trait]
pub trait PerformanceGrader: Send + Sync {
    /// Raw grading payload for `url`.
    async fn grade(&self, url: &str) -> Result<Value, GraderError>;
}

pub struct PageSpeedClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl PageSpeedClient {
    pub fn new(config: &PerformanceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn query<'a>(&'a self, url: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("url", url)];
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));
        if let Some(ref key) = self.api_key {
            query.push(("key", key.as_str()));
        }
        query
    }
}

#[async_trait]
impl PerformanceGrader for PageSpeedClient {
    async fn grade(&self, url: &str) -> Result<Value, GraderError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&self.query(url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraderError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Normalize a PageSpeed v5 payload into a per-page result.
pub fn normalize(url: &str, payload: &Value) -> Result<PagePerformance, GraderError> {
    let lighthouse = payload
        .get("lighthouseResult")
        .ok_or(GraderError::Malformed("missing lighthouseResult"))?;
    let audits = lighthouse
        .get("audits")
        .and_then(Value::as_object)
        .ok_or(GraderError::Malformed("missing audits"))?;
    let categories = lighthouse
        .get("categories")
        .and_then(Value::as_object)
        .ok_or(GraderError::Malformed("missing categories"))?;

    let category_score = |name: &str| {
        let score = categories
            .get(name)
            .and_then(|c| c.get("score"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        (score * 100.0).round() as u32
    };

    let display = |id: &str, fallback: &str| {
        audits
            .get(id)
            .and_then(|a| a.get("displayValue"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    Ok(PagePerformance {
        url: url.to_string(),
        overall_score: OverallScore {
            performance: category_score("performance"),
            accessibility: category_score("accessibility"),
            best_practices: category_score("best-practices"),
            seo: category_score("seo"),
        },
        metrics: Metrics {
            fcp: display("first-contentful-paint", "0s"),
            lcp: display("largest-contentful-paint", "0s"),
            tti: display("interactive", "0s"),
            speed_index: display("speed-index", "0s"),
            blocking_time: display("total-blocking-time", "0ms"),
            cls: display("cumulative-layout-shift", "0"),
        },
        accessibility: AccessibilityChecks {
            color_contrast: all_pass(audits, &["color-contrast"]),
            alt_text: alt_text_percent(audits),
            keyboard: all_pass(audits, &["tabindex", "accesskeys"]),
            screen_reader: all_pass(audits, &["aria-allowed-attr", "button-name", "link-name"]),
            focus_indicators: all_pass(audits, &["focus-traps", "focusable-controls"]),
        },
        best_practices: BestPracticeChecks {
            https: all_pass(audits, &["is-on-https"]),
            deprecated_apis: item_count(audits, "deprecations").unwrap_or(0),
            console_errors: item_count(audits, "errors-in-console").unwrap_or(0),
        },
        seo: SeoChecks {
            meta_description: all_pass(audits, &["meta-description"]),
            title_tag: all_pass(audits, &["document-title"]),
            structured_data: all_pass(audits, &["structured-data"]),
            crawlable_links: all_pass(audits, &["crawlable-anchors"]),
            mobile_friendly: all_pass(audits, &["viewport"]),
        },
        opportunities: opportunities(audits),
        diagnostics: diagnostics(audits),
        recommendations: recommendations(audits),
    })
}

fn text(audit: &Value, key: &str) -> String {
    audit
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn mode(audit: &Value) -> &str {
    audit
        .get("scoreDisplayMode")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn score(audit: &Value) -> Option<f64> {
    audit.get("score").and_then(Value::as_f64)
}

fn item_count(audits: &Map<String, Value>, id: &str) -> Option<u32> {
    audits
        .get(id)?
        .get("details")?
        .get("items")?
        .as_array()
        .map(|items| items.len() as u32)
}

/// Pass iff every audit is present and either perfect or not scored.
fn all_pass(audits: &Map<String, Value>, ids: &[&str]) -> CheckOutcome {
    CheckOutcome::from_bool(ids.iter().all(|id| {
        audits.get(*id).is_some_and(|audit| {
            matches!(mode(audit), "notApplicable" | "manual") || score(audit) == Some(1.0)
        })
    }))
}

fn alt_text_percent(audits: &Map<String, Value>) -> String {
    match audits.get("image-alt").and_then(score) {
        Some(s) => format!("{}%", (s * 100.0).round() as u32),
        None => "N/A".to_string(),
    }
}

fn opportunities(audits: &Map<String, Value>) -> Vec<Opportunity> {
    audits
        .values()
        .filter(|a| {
            a.get("details")
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
                == Some("opportunity")
        })
        .map(|a| {
            let savings_ms = a
                .get("details")
                .and_then(|d| d.get("overallSavingsMs"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Opportunity {
                id: text(a, "id"),
                title: text(a, "title"),
                description: text(a, "description"),
                estimated_savings: format!("{:.1}s", savings_ms / 1000.0),
                impact: "High".into(),
                effort: "Medium".into(),
                priority: "High".into(),
            }
        })
        .collect()
}

fn diagnostics(audits: &Map<String, Value>) -> Vec<Diagnostic> {
    audits
        .values()
        .filter(|a| mode(a) == "informative")
        .map(|a| Diagnostic {
            id: text(a, "id"),
            title: text(a, "title"),
            description: text(a, "description"),
            score: score(a),
            impact: "Informational".into(),
            effort: "Low".into(),
            priority: "Medium".into(),
        })
        .collect()
}

fn recommendations(audits: &Map<String, Value>) -> Vec<Recommendation> {
    audits
        .values()
        .filter(|a| mode(a) == "numeric" && score(a).is_some_and(|s| s < 1.0))
        .map(|a| {
            let title = text(a, "title");
            let impact = if title.contains("JavaScript") {
                "Could improve TTI"
            } else {
                "May enhance performance"
            };
            let details = match a
                .get("details")
                .and_then(|d| d.get("items"))
                .and_then(Value::as_array)
            {
                Some(items) => format!("{} issues found", items.len()),
                None => "Some issues found".to_string(),
            };
            Recommendation {
                id: text(a, "id"),
                description: text(a, "description"),
                score: score(a),
                impact: impact.into(),
                effort: "Medium".into(),
                priority: "Medium".into(),
                details,
                title,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "lighthouseResult": {
                "categories": {
                    "performance": {"score": 0.874},
                    "accessibility": {"score": 0.9},
                    "best-practices": {"score": 1},
                    "seo": {"score": null}
                },
                "audits": {
                    "first-contentful-paint": {"id": "first-contentful-paint", "displayValue": "1.2 s", "score": 0.9, "scoreDisplayMode": "numeric"},
                    "total-blocking-time": {"id": "total-blocking-time", "displayValue": "120 ms", "score": 1, "scoreDisplayMode": "numeric"},
                    "render-blocking-resources": {
                        "id": "render-blocking-resources",
                        "title": "Eliminate render-blocking resources",
                        "description": "Resources are blocking the first paint.",
                        "score": 0.5,
                        "scoreDisplayMode": "metricSavings",
                        "details": {"type": "opportunity", "overallSavingsMs": 1530, "items": [{}, {}]}
                    },
                    "bootup-time": {
                        "id": "bootup-time",
                        "title": "Reduce JavaScript execution time",
                        "description": "Consider reducing parse time.",
                        "score": 0.6,
                        "scoreDisplayMode": "numeric",
                        "details": {"type": "table", "items": [{}, {}, {}]}
                    },
                    "speed-index": {"id": "speed-index", "title": "Speed Index", "score": 0.4, "scoreDisplayMode": "numeric", "displayValue": "4.1 s"},
                    "network-rtt": {"id": "network-rtt", "title": "Network Round Trip Times", "score": null, "scoreDisplayMode": "informative"},
                    "color-contrast": {"id": "color-contrast", "score": 1, "scoreDisplayMode": "binary"},
                    "image-alt": {"id": "image-alt", "score": 0.5, "scoreDisplayMode": "binary"},
                    "tabindex": {"id": "tabindex", "score": null, "scoreDisplayMode": "notApplicable"},
                    "accesskeys": {"id": "accesskeys", "score": null, "scoreDisplayMode": "notApplicable"},
                    "button-name": {"id": "button-name", "score": 0, "scoreDisplayMode": "binary"},
                    "is-on-https": {"id": "is-on-https", "score": 1, "scoreDisplayMode": "binary"},
                    "deprecations": {"id": "deprecations", "score": 0, "scoreDisplayMode": "binary", "details": {"type": "table", "items": [{}, {}]}},
                    "errors-in-console": {"id": "errors-in-console", "score": 0, "scoreDisplayMode": "binary", "details": {"type": "table", "items": [{}]}}
                }
            }
        })
    }

    #[test]
    fn test_scores_rounded_and_missing_default_to_zero() {
        let page = normalize("https://example.com/", &payload()).unwrap();
        assert_eq!(page.overall_score.performance, 87);
        assert_eq!(page.overall_score.accessibility, 90);
        assert_eq!(page.overall_score.best_practices, 100);
        assert_eq!(page.overall_score.seo, 0);
    }

    #[test]
    fn test_metric_display_values_with_fallbacks() {
        let metrics = normalize("https://example.com/", &payload()).unwrap().metrics;
        assert_eq!(metrics.fcp, "1.2 s");
        assert_eq!(metrics.blocking_time, "120 ms");
        assert_eq!(metrics.speed_index, "4.1 s");
        assert_eq!(metrics.lcp, "0s");
        assert_eq!(metrics.tti, "0s");
        assert_eq!(metrics.cls, "0");
    }

    #[test]
    fn test_findings_classification() {
        let page = normalize("https://example.com/", &payload()).unwrap();

        assert_eq!(page.opportunities.len(), 1);
        let opp = &page.opportunities[0];
        assert_eq!(opp.title, "Eliminate render-blocking resources");
        assert_eq!(opp.estimated_savings, "1.5s");
        assert_eq!(opp.impact, "High");

        assert_eq!(page.diagnostics.len(), 1);
        assert_eq!(page.diagnostics[0].impact, "Informational");
        assert_eq!(page.diagnostics[0].score, None);

        let titles: Vec<_> = page.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"Reduce JavaScript execution time"));
        assert!(titles.contains(&"Speed Index"));
        assert!(!titles.contains(&"Eliminate render-blocking resources"));

        let js = page
            .recommendations
            .iter()
            .find(|r| r.id == "bootup-time")
            .unwrap();
        assert_eq!(js.impact, "Could improve TTI");
        assert_eq!(js.details, "3 issues found");

        let si = page.recommendations.iter().find(|r| r.id == "speed-index").unwrap();
        assert_eq!(si.impact, "May enhance performance");
        assert_eq!(si.details, "Some issues found");
    }

    #[test]
    fn test_sub_checks() {
        let page = normalize("https://example.com/", &payload()).unwrap();
        assert_eq!(page.accessibility.color_contrast, CheckOutcome::Pass);
        assert_eq!(page.accessibility.alt_text, "50%");
        assert_eq!(page.accessibility.keyboard, CheckOutcome::Pass);
        // button-name scores 0 and the other screen-reader audits are absent
        assert_eq!(page.accessibility.screen_reader, CheckOutcome::Fail);
        assert_eq!(page.accessibility.focus_indicators, CheckOutcome::Fail);
        assert_eq!(page.best_practices.https, CheckOutcome::Pass);
        assert_eq!(page.best_practices.deprecated_apis, 2);
        assert_eq!(page.best_practices.console_errors, 1);
        assert_eq!(page.seo.title_tag, CheckOutcome::Fail);
    }

    #[test]
    fn test_malformed_payload() {
        let err = normalize("https://example.com/", &json!({"error": {"code": 500}})).unwrap_err();
        assert!(matches!(err, GraderError::Malformed(_)));
    }

    #[test]
    fn test_query_includes_categories_and_key() {
        let client = PageSpeedClient::new(&PerformanceConfig {
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();
        let query = client.query("https://example.com/");
        assert_eq!(query[0], ("url", "https://example.com/"));
        assert_eq!(query.iter().filter(|(k, _)| *k == "category").count(), 4);
        assert_eq!(query.last(), Some(&("key", "k")));
    }
}
