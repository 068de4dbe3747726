//! Site-wide compliance aggregation.
//!
//! Every check is a conjunction over the audited pages: one failing page
//! fails the check for the whole site.

use crate::models::{
    ActionItem, CategoryResult, CheckResult, CheckStatus, ComplianceSummary, PageSignals, Priority,
};

const TECHNICAL_SEO: &str = "Technical SEO";

struct CheckDef {
    title: &'static str,
    passes: fn(&PageSignals) -> bool,
    pass_text: &'static str,
    fail_text: &'static str,
    fix: &'static str,
}

struct CategoryDef {
    name: &'static str,
    checks: &'static [CheckDef],
}

const CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Meta Tags",
        checks: &[
            CheckDef {
                title: "Meta Title Present",
                passes: |p| !p.title.is_empty(),
                pass_text: "Title tag is present.",
                fail_text: "Missing <title> tag.",
                fix: "Add a <title> tag to each page.",
            },
            CheckDef {
                title: "Meta Title Length",
                passes: |p| (10..=70).contains(&char_len(&p.title)),
                pass_text: "Title length is valid.",
                fail_text: "Title should be 10–70 characters.",
                fix: "Adjust the <title> to be 10–70 characters long.",
            },
            CheckDef {
                title: "Meta Description Present",
                passes: |p| !p.description.is_empty(),
                pass_text: "Meta description is present.",
                fail_text: "Missing meta description.",
                fix: "Add a meta description to each page.",
            },
            CheckDef {
                title: "Meta Description Length",
                passes: |p| (50..=160).contains(&char_len(&p.description)),
                pass_text: "Description length is valid.",
                fail_text: "Meta description should be 50–160 characters.",
                fix: "Adjust meta descriptions to be between 50–160 characters long.",
            },
        ],
    },
    CategoryDef {
        name: "Content Structure",
        checks: &[
            CheckDef {
                title: "H1 Tags",
                passes: |p| p.h1_count == 1,
                pass_text: "Exactly one <h1> tag found.",
                fail_text: "Page must have exactly one <h1> tag.",
                fix: "Ensure each page has one <h1> tag.",
            },
            CheckDef {
                title: "Content Length",
                passes: |p| p.word_count >= 300,
                pass_text: "Content is sufficient.",
                fail_text: "Content is too short (less than 300 words).",
                fix: "Ensure each page has at least 300 words.",
            },
            CheckDef {
                title: "Internal Linking",
                passes: |p| p.internal_links_count >= 3,
                pass_text: "Sufficient internal links found.",
                fail_text: "Too few internal links.",
                fix: "Add at least 3 internal links per page to related content.",
            },
        ],
    },
    CategoryDef {
        name: TECHNICAL_SEO,
        checks: &[
            CheckDef {
                title: "Canonical Tags",
                passes: |p| !p.canonical.is_empty(),
                pass_text: "Canonical tag present.",
                fail_text: "Missing canonical tag.",
                fix: "Add <link rel='canonical'> to each page.",
            },
            CheckDef {
                title: "Viewport Meta Tag",
                passes: |p| p.has_viewport,
                pass_text: "Viewport tag present.",
                fail_text: "Missing viewport meta tag.",
                fix: "Add <meta name='viewport' content='width=device-width, initial-scale=1'>.",
            },
            CheckDef {
                title: "Robots.txt Found",
                passes: |p| p.robots_txt_found,
                pass_text: "robots.txt file exists.",
                fail_text: "robots.txt missing.",
                fix: "Ensure robots.txt is accessible at /robots.txt.",
            },
            CheckDef {
                title: "Sitemap Found",
                passes: |p| p.sitemap_found,
                pass_text: "Sitemap found.",
                fail_text: "Sitemap not found.",
                fix: "Add sitemap.xml and reference it in robots.txt.",
            },
            CheckDef {
                title: "Schema Markup Present",
                passes: |p| p.has_schema,
                pass_text: "Structured data (JSON-LD) detected.",
                fail_text: "No schema markup found.",
                fix: "Add JSON-LD or Microdata to describe the content structure.",
            },
        ],
    },
    CategoryDef {
        name: "Images & Media",
        checks: &[
            CheckDef {
                title: "Alt Text",
                passes: |p| p.images_missing_alt == 0,
                pass_text: "All images have alt text.",
                fail_text: "Some images are missing alt text.",
                fix: "Add descriptive alt text to all <img> tags.",
            },
            CheckDef {
                title: "Image Optimization",
                passes: |p| p.large_images.is_empty(),
                pass_text: "No unoptimized images found.",
                fail_text: "Some images are larger than 200KB.",
                fix: "Compress and resize large images.",
            },
            CheckDef {
                title: "Image Formats",
                passes: |p| p.uses_modern_format,
                pass_text: "Modern image formats used.",
                fail_text: "Some images are not in WebP or AVIF.",
                fix: "Use modern formats like WebP or AVIF.",
            },
        ],
    },
];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Number of checks in the battery, independent of page count.
pub fn total_checks() -> u32 {
    CATEGORIES.iter().map(|c| c.checks.len() as u32).sum()
}

/// Fold per-page signals into the category/check tree.
///
/// Returns `None` for an empty page list; a run with nothing audited is a
/// failure, not a zero score.
pub fn build_summary(pages: &[PageSignals]) -> Option<ComplianceSummary> {
    if pages.is_empty() {
        return None;
    }

    let mut passed = 0u32;
    let mut total = 0u32;
    let mut categories = Vec::with_capacity(CATEGORIES.len());
    let mut action_items = Vec::new();

    for category in CATEGORIES {
        let priority = if category.name == TECHNICAL_SEO {
            Priority::High
        } else {
            Priority::Medium
        };

        let checks = category
            .checks
            .iter()
            .map(|check| {
                total += 1;
                let ok = pages.iter().all(check.passes);
                if ok {
                    passed += 1;
                } else {
                    action_items.push(ActionItem {
                        label: check.title.to_string(),
                        fix: check.fix.to_string(),
                        priority,
                    });
                }
                CheckResult {
                    title: check.title.to_string(),
                    status: if ok {
                        CheckStatus::Good
                    } else {
                        CheckStatus::NeedsFix
                    },
                    description: (if ok { check.pass_text } else { check.fail_text }).to_string(),
                    fix: (!ok).then(|| check.fix.to_string()),
                }
            })
            .collect();

        categories.push(CategoryResult {
            category: category.name.to_string(),
            checks,
        });
    }

    Some(ComplianceSummary {
        seo_score: format!("{}%", percent(passed, total)),
        passed_checks: passed,
        total_checks: total,
        categories,
        action_items,
    })
}

/// `round(passed / total * 100)`, halves rounding up.
fn percent(passed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(passed) / f64::from(total) * 100.0).round() as u32
}
