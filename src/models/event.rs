//! Lifecycle events published while an audit runs.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::AuditKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Completed,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Transient pub/sub message scoped to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub kind: EventKind,
    pub audit: AuditKind,
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatbot_id: Option<String>,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Updated record on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn started(
        audit: AuditKind,
        organization_id: &str,
        chatbot_id: &str,
        estimated_seconds: u64,
    ) -> Self {
        Self {
            kind: EventKind::Started,
            audit,
            organization_id: organization_id.to_string(),
            chatbot_id: Some(chatbot_id.to_string()),
            message: format!("{} audit started", audit.label()),
            started_at: Some(Utc::now().timestamp_millis()),
            estimated_seconds: Some(estimated_seconds),
            error: None,
            data: None,
        }
    }

    pub fn completed(
        audit: AuditKind,
        organization_id: &str,
        chatbot_id: &str,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind: EventKind::Completed,
            audit,
            organization_id: organization_id.to_string(),
            chatbot_id: Some(chatbot_id.to_string()),
            message: format!("SEO {} audit completed.", audit.as_str()),
            started_at: None,
            estimated_seconds: None,
            error: None,
            data: Some(data),
        }
    }

    pub fn error(
        audit: AuditKind,
        organization_id: &str,
        chatbot_id: Option<&str>,
        message: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            kind: EventKind::Error,
            audit,
            organization_id: organization_id.to_string(),
            chatbot_id: chatbot_id.map(str::to_string),
            message: message.into(),
            started_at: None,
            estimated_seconds: None,
            error,
            data: None,
        }
    }

    /// Channel name, e.g. `seo:compliance:started:org-1`.
    pub fn topic(&self) -> String {
        format!(
            "seo:{}:{}:{}",
            self.audit.as_str(),
            self.kind.as_str(),
            self.organization_id
        )
    }
}
