//! Base URL registration for a chatbot's site.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use url::{Host, Url};

use crate::error::{AuditError, AuditResult};
use crate::models::{ComplianceRecord, PerformanceRecord};
use crate::repository::AuditStore;

/// Both records for a registered site.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredSite {
    pub compliance: ComplianceRecord,
    pub performance: PerformanceRecord,
}

/// Parse `raw` and reduce it to its origin.
///
/// Only public http(s) hostnames are accepted.
pub fn normalize_base_url(raw: &str) -> AuditResult<String> {
    let url = Url::parse(raw.trim())
        .map_err(|_| AuditError::InvalidBaseUrl("Invalid baseUrl format".to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuditError::InvalidBaseUrl(
            "Only http and https URLs are supported".to_string(),
        ));
    }

    match url.host() {
        Some(Host::Domain(domain)) if !is_local_name(domain) => {}
        Some(_) => {
            return Err(AuditError::InvalidBaseUrl(
                "Localhost or IP-based URLs are not allowed".to_string(),
            ))
        }
        None => {
            return Err(AuditError::InvalidBaseUrl(
                "Invalid baseUrl format".to_string(),
            ))
        }
    }

    Ok(url.origin().ascii_serialization())
}

fn is_local_name(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    domain == "localhost" || domain.ends_with(".localhost")
}

/// Register `raw_url` for a chatbot, creating empty records when missing.
///
/// Re-registering an existing site refreshes `configured_at`, making it the
/// site subsequent triggers audit.
pub async fn register_base_url(
    store: &dyn AuditStore,
    chatbot_id: &str,
    raw_url: &str,
) -> AuditResult<RegisteredSite> {
    let origin = normalize_base_url(raw_url)?;

    if store.get_chatbot(chatbot_id).await?.is_none() {
        return Err(AuditError::ChatbotNotFound);
    }

    let now = Utc::now();

    let compliance = match store.find_compliance(chatbot_id, &origin).await? {
        Some(mut existing) => {
            existing.configured_at = now;
            existing
        }
        None => ComplianceRecord::new(chatbot_id, &origin),
    };
    store.save_compliance(&compliance).await?;

    let performance = match store.find_performance(chatbot_id, &origin).await? {
        Some(mut existing) => {
            existing.configured_at = now;
            existing
        }
        None => PerformanceRecord::new(chatbot_id, &origin),
    };
    store.save_performance(&performance).await?;

    info!("Registered {} for chatbot {}", origin, chatbot_id);
    Ok(RegisteredSite {
        compliance,
        performance,
    })
}
