//! Error taxonomy for audit runs.
//!
//! Validation errors surface synchronously to the trigger caller. Everything
//! after acknowledgment is reported through the event channel only.

use axum::http::StatusCode;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::repository::StoreError;

/// Result alias for orchestrator-level operations.
pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Chatbot not found")]
    ChatbotNotFound,
    #[error("Subscription not found")]
    SubscriptionNotFound,
    #[error("Base URL not configured. Please install via chatbot-sdk.")]
    BaseUrlNotConfigured,
    #[error("{0}")]
    InvalidBaseUrl(String),
    #[error("{message}")]
    QuotaExceeded { message: String },
    #[error("{0} audit failed. No successful results.")]
    AllAuditsFailed(&'static str),
    #[error("Browser launch failure: {0}")]
    BrowserLaunchFailure(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuditError {
    /// HTTP status an API adapter should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuditError::BaseUrlNotConfigured | AuditError::InvalidBaseUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            AuditError::ChatbotNotFound | AuditError::SubscriptionNotFound => {
                StatusCode::NOT_FOUND
            }
            AuditError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuditError::AllAuditsFailed(_)
            | AuditError::BrowserLaunchFailure(_)
            | AuditError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BrowserError> for AuditError {
    fn from(e: BrowserError) -> Self {
        AuditError::BrowserLaunchFailure(e.to_string())
    }
}

/// Failure of a single page audit. Recovered by excluding the page.
#[derive(Debug, Error)]
pub enum PageAuditError {
    #[error("browser: {0}")]
    Browser(#[from] BrowserError),
    #[error("grading service: {0}")]
    ExternalService(String),
}
