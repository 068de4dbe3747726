//! siteaudit - SEO compliance and performance audit engine.
//!
//! Discovers a tenant site's internal pages with a rendering browser, audits
//! every page under bounded concurrency, folds the per-page results into one
//! organization-level record, enforces weekly tier quotas, and publishes run
//! lifecycle events to subscribers.

pub mod audit;
pub mod browser;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod pool;
pub mod quota;
pub mod repository;
pub mod schema;
pub mod server;
pub mod sites;

pub use error::{AuditError, AuditResult};
pub use orchestrator::{AuditOrchestrator, RunOutcome, TriggerAck};
