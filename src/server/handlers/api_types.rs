//! Request and response types for the JSON API.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::models::{ComplianceRecord, PerformanceRecord};

/// Standard API response envelope.
///
/// Every endpoint returns this wrapper:
/// ```json
/// { "error": false, "data": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub error: bool,
    pub data: T,
}

/// Error payload inside the envelope.
#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub message: String,
}

impl ApiResponse<ErrorData> {
    pub fn error(status: StatusCode, message: impl Into<String>) -> impl IntoResponse {
        (
            status,
            Json(ApiResponse {
                error: true,
                data: ErrorData {
                    message: message.into(),
                },
            }),
        )
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<ApiResponse<T>> {
        Json(ApiResponse { error: false, data })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageData {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SiteData {
    pub message: &'static str,
    pub compliance: ComplianceRecord,
    pub performance: PerformanceRecord,
}

/// Body of `POST /api/seo/site`.
#[derive(Debug, Deserialize)]
pub struct RegisterSiteRequest {
    pub chatbot_id: Option<String>,
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
}

/// Body of the trigger endpoints.
#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub chatbot_id: Option<String>,
}

/// Query string of the fetch endpoints.
#[derive(Debug, Deserialize)]
pub struct ChatbotQuery {
    pub chatbot_id: Option<String>,
}
