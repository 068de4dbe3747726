//! Site registration, audit triggers, and record fetches.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::api_types::{
    ApiResponse, ChatbotQuery, HealthData, MessageData, RegisterSiteRequest, SiteData,
    TriggerRequest,
};
use crate::error::AuditError;
use crate::models::AuditKind;
use crate::server::AppState;
use crate::sites::register_base_url;

fn audit_error(e: AuditError) -> Response {
    let status = e.status_code();
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    ApiResponse::error(status, e.to_string()).into_response()
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn health() -> impl IntoResponse {
    ApiResponse::ok(HealthData {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/seo/site`
pub async fn register_site(
    State(state): State<AppState>,
    Json(body): Json<RegisterSiteRequest>,
) -> Response {
    let (Some(chatbot_id), Some(base_url)) = (required(body.chatbot_id), required(body.base_url))
    else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "Missing chatbot_id or baseUrl")
            .into_response();
    };

    match register_base_url(state.store.as_ref(), &chatbot_id, &base_url).await {
        Ok(site) => ApiResponse::ok(SiteData {
            message: "Compliance & Performance created or updated successfully",
            compliance: site.compliance,
            performance: site.performance,
        })
        .into_response(),
        Err(e) => audit_error(e),
    }
}

async fn trigger(state: AppState, kind: AuditKind, body: TriggerRequest) -> Response {
    let Some(chatbot_id) = required(body.chatbot_id) else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "chatbot_id is required")
            .into_response();
    };

    match state.orchestrator.trigger(kind, &chatbot_id).await {
        // The run continues detached; its handle is not awaited here.
        Ok(ack) => (
            StatusCode::ACCEPTED,
            ApiResponse::ok(MessageData {
                message: ack.message,
            }),
        )
            .into_response(),
        Err(e) => audit_error(e),
    }
}

/// `POST /api/seo/compliance/trigger`
pub async fn trigger_compliance(
    State(state): State<AppState>,
    Json(body): Json<TriggerRequest>,
) -> Response {
    trigger(state, AuditKind::Compliance, body).await
}

/// `POST /api/seo/performance/trigger`
pub async fn trigger_performance(
    State(state): State<AppState>,
    Json(body): Json<TriggerRequest>,
) -> Response {
    trigger(state, AuditKind::Performance, body).await
}

/// `GET /api/seo/compliance?chatbot_id=`
pub async fn get_compliance(
    State(state): State<AppState>,
    Query(params): Query<ChatbotQuery>,
) -> Response {
    let Some(chatbot_id) = required(params.chatbot_id) else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "chatbot_id is required")
            .into_response();
    };

    match state.store.latest_compliance(&chatbot_id).await {
        Ok(Some(record)) if record.updated_at.is_some() => ApiResponse::ok(record).into_response(),
        Ok(_) => ApiResponse::error(StatusCode::NOT_FOUND, "No audit found.").into_response(),
        Err(e) => audit_error(e.into()),
    }
}

/// `GET /api/seo/performance?chatbot_id=`
pub async fn get_performance(
    State(state): State<AppState>,
    Query(params): Query<ChatbotQuery>,
) -> Response {
    let Some(chatbot_id) = required(params.chatbot_id) else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "chatbot_id is required")
            .into_response();
    };

    match state.store.latest_performance(&chatbot_id).await {
        Ok(Some(record)) if record.updated_at.is_some() => ApiResponse::ok(record).into_response(),
        Ok(_) => ApiResponse::error(StatusCode::NOT_FOUND, "No audit found.").into_response(),
        Err(e) => audit_error(e.into()),
    }
}
