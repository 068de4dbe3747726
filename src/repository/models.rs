//! Diesel row types and their conversions to domain models.
//!
//! Structured record fields are stored as JSON text.

use diesel::prelude::*;

use super::{format_datetime, parse_datetime, parse_datetime_opt, StoreError};
use crate::models::{Chatbot, ComplianceRecord, PerformanceRecord, Subscription};
use crate::schema;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::chatbots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChatbotRecord {
    pub chatbot_id: String,
    pub organization_id: String,
}

impl From<ChatbotRecord> for Chatbot {
    fn from(record: ChatbotRecord) -> Self {
        Chatbot::new(record.chatbot_id, record.organization_id)
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::subscriptions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SubscriptionRecord {
    pub organization_id: String,
    pub subscription_tier: String,
    pub compliance_trigger_count: i32,
    pub performance_trigger_count: i32,
}

impl From<SubscriptionRecord> for Subscription {
    fn from(record: SubscriptionRecord) -> Self {
        Subscription {
            organization_id: record.organization_id,
            tier: record.subscription_tier,
            compliance_trigger_count: record.compliance_trigger_count.max(0) as u32,
            performance_trigger_count: record.performance_trigger_count.max(0) as u32,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::compliance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ComplianceRow {
    pub chatbot_id: String,
    pub base_url: String,
    pub seo_score: Option<String>,
    pub passed_checks: i32,
    pub total_checks: i32,
    pub categories: String,
    pub action_items: String,
    pub configured_at: String,
    pub updated_at: Option<String>,
}

impl From<ComplianceRow> for ComplianceRecord {
    fn from(row: ComplianceRow) -> Self {
        ComplianceRecord {
            chatbot_id: row.chatbot_id,
            base_url: row.base_url,
            seo_score: row.seo_score,
            passed_checks: row.passed_checks.max(0) as u32,
            total_checks: row.total_checks.max(0) as u32,
            categories: serde_json::from_str(&row.categories).unwrap_or_default(),
            action_items: serde_json::from_str(&row.action_items).unwrap_or_default(),
            configured_at: parse_datetime(&row.configured_at),
            updated_at: parse_datetime_opt(row.updated_at),
        }
    }
}

impl TryFrom<&ComplianceRecord> for ComplianceRow {
    type Error = StoreError;

    fn try_from(record: &ComplianceRecord) -> Result<Self, Self::Error> {
        Ok(ComplianceRow {
            chatbot_id: record.chatbot_id.clone(),
            base_url: record.base_url.clone(),
            seo_score: record.seo_score.clone(),
            passed_checks: record.passed_checks as i32,
            total_checks: record.total_checks as i32,
            categories: serde_json::to_string(&record.categories)?,
            action_items: serde_json::to_string(&record.action_items)?,
            configured_at: format_datetime(&record.configured_at),
            updated_at: record.updated_at.as_ref().map(format_datetime),
        })
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::performance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PerformanceRow {
    pub chatbot_id: String,
    pub base_url: String,
    pub overall_score: Option<String>,
    pub metrics: Option<String>,
    pub accessibility: Option<String>,
    pub best_practices: Option<String>,
    pub seo: Option<String>,
    pub opportunities: String,
    pub diagnostics: String,
    pub recommendations: String,
    pub configured_at: String,
    pub updated_at: Option<String>,
}

fn json_opt<T: serde::de::DeserializeOwned>(text: Option<String>) -> Option<T> {
    text.and_then(|s| serde_json::from_str(&s).ok())
}

fn to_json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>, StoreError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StoreError::from)
}

impl From<PerformanceRow> for PerformanceRecord {
    fn from(row: PerformanceRow) -> Self {
        PerformanceRecord {
            chatbot_id: row.chatbot_id,
            base_url: row.base_url,
            overall_score: json_opt(row.overall_score),
            metrics: json_opt(row.metrics),
            accessibility: json_opt(row.accessibility),
            best_practices: json_opt(row.best_practices),
            seo: json_opt(row.seo),
            opportunities: serde_json::from_str(&row.opportunities).unwrap_or_default(),
            diagnostics: serde_json::from_str(&row.diagnostics).unwrap_or_default(),
            recommendations: serde_json::from_str(&row.recommendations).unwrap_or_default(),
            configured_at: parse_datetime(&row.configured_at),
            updated_at: parse_datetime_opt(row.updated_at),
        }
    }
}

impl TryFrom<&PerformanceRecord> for PerformanceRow {
    type Error = StoreError;

    fn try_from(record: &PerformanceRecord) -> Result<Self, Self::Error> {
        Ok(PerformanceRow {
            chatbot_id: record.chatbot_id.clone(),
            base_url: record.base_url.clone(),
            overall_score: to_json_opt(&record.overall_score)?,
            metrics: to_json_opt(&record.metrics)?,
            accessibility: to_json_opt(&record.accessibility)?,
            best_practices: to_json_opt(&record.best_practices)?,
            seo: to_json_opt(&record.seo)?,
            opportunities: serde_json::to_string(&record.opportunities)?,
            diagnostics: serde_json::to_string(&record.diagnostics)?,
            recommendations: serde_json::to_string(&record.recommendations)?,
            configured_at: format_datetime(&record.configured_at),
            updated_at: record.updated_at.as_ref().map(format_datetime),
        })
    }
}
