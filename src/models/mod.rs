//! Domain models.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

mod compliance;
mod event;
mod performance;
mod tenant;

pub use compliance::{
    ActionItem, CategoryResult, CheckResult, CheckStatus, ComplianceRecord, ComplianceSummary,
    PageSignals, Priority,
};
pub use event::{AuditEvent, EventKind};
pub use performance::{
    AccessibilityChecks, BestPracticeChecks, CheckOutcome, Diagnostic, Metrics, Opportunity,
    OverallScore, PagePerformance, PerformanceRecord, PerformanceSummary, Recommendation,
    SeoChecks, Titled,
};
pub use tenant::{AuditKind, Chatbot, Subscription, Tier};
