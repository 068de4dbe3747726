//! Site-wide performance aggregation.

use std::collections::HashMap;

use crate::models::{
    AccessibilityChecks, BestPracticeChecks, CheckOutcome, Metrics, OverallScore, PagePerformance,
    PerformanceSummary, SeoChecks, Titled,
};

/// Average and merge per-page results. `None` when nothing was graded.
pub fn build_summary(pages: &[PagePerformance]) -> Option<PerformanceSummary> {
    if pages.is_empty() {
        return None;
    }

    let score = |f: fn(&OverallScore) -> u32| {
        average(pages.iter().map(|p| f64::from(f(&p.overall_score))))
    };
    let metric =
        |f: fn(&Metrics) -> &str| average(pages.iter().map(|p| parse_metric(f(&p.metrics))));
    let every = |f: fn(&PagePerformance) -> CheckOutcome| {
        CheckOutcome::from_bool(pages.iter().all(|p| f(p).passed()))
    };

    let alt_text = pages
        .iter()
        .map(|p| parse_leading_int(&p.accessibility.alt_text));
    let alt_text = match average(alt_text) {
        0 => "N/A".to_string(),
        pct => format!("{}%", pct),
    };

    Some(PerformanceSummary {
        overall_score: OverallScore {
            performance: score(|s| s.performance),
            accessibility: score(|s| s.accessibility),
            best_practices: score(|s| s.best_practices),
            seo: score(|s| s.seo),
        },
        metrics: Metrics {
            fcp: format!("{}s", metric(|m| m.fcp.as_str())),
            lcp: format!("{}s", metric(|m| m.lcp.as_str())),
            tti: format!("{}s", metric(|m| m.tti.as_str())),
            speed_index: format!("{}s", metric(|m| m.speed_index.as_str())),
            blocking_time: format!("{}ms", metric(|m| m.blocking_time.as_str())),
            cls: metric(|m| m.cls.as_str()).to_string(),
        },
        accessibility: AccessibilityChecks {
            color_contrast: every(|p| p.accessibility.color_contrast),
            alt_text,
            keyboard: every(|p| p.accessibility.keyboard),
            screen_reader: every(|p| p.accessibility.screen_reader),
            focus_indicators: every(|p| p.accessibility.focus_indicators),
        },
        best_practices: BestPracticeChecks {
            https: every(|p| p.best_practices.https),
            deprecated_apis: pages.iter().map(|p| p.best_practices.deprecated_apis).sum(),
            console_errors: pages.iter().map(|p| p.best_practices.console_errors).sum(),
        },
        seo: SeoChecks {
            meta_description: every(|p| p.seo.meta_description),
            title_tag: every(|p| p.seo.title_tag),
            structured_data: every(|p| p.seo.structured_data),
            crawlable_links: every(|p| p.seo.crawlable_links),
            mobile_friendly: every(|p| p.seo.mobile_friendly),
        },
        opportunities: dedupe_by_title(pages.iter().flat_map(|p| p.opportunities.iter().cloned())),
        diagnostics: dedupe_by_title(pages.iter().flat_map(|p| p.diagnostics.iter().cloned())),
        recommendations: dedupe_by_title(
            pages.iter().flat_map(|p| p.recommendations.iter().cloned()),
        ),
    })
}

/// Mean rounded to the nearest integer, halves up. Empty input is 0.
fn average(values: impl Iterator<Item = f64>) -> u32 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return 0;
    }
    (sum / count as f64 + 0.5).floor() as u32
}

/// Numeric part of a display string: `"1,200 ms"` -> 1200, `"2.4 s"` -> 2.4.
/// Anything unparseable counts as 0.
fn parse_metric(display: &str) -> f64 {
    let digits: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    leading_float(&digits)
}

fn parse_leading_int(s: &str) -> f64 {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0.0)
}

/// Longest prefix that parses as a float, like a lenient float parse.
fn leading_float(s: &str) -> f64 {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Keep one entry per title: the last value wins, at the first title's position.
fn dedupe_by_title<T: Titled>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<T> = Vec::new();
    for item in items {
        match index.get(item.title()) {
            Some(&i) => merged[i] = item,
            None => {
                index.insert(item.title().to_string(), merged.len());
                merged.push(item);
            }
        }
    }
    merged
}
