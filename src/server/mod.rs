//! HTTP API over the audit orchestrator.
//!
//! Provides:
//! - Base URL registration
//! - Compliance and performance triggers (acknowledged with 202)
//! - Latest audited records
//! - A Server-Sent Events feed of run lifecycle events

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::events::BroadcastEventBus;
use crate::orchestrator::AuditOrchestrator;
use crate::repository::{AuditStore, MemoryAuditStore, SqliteAuditStore};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: AuditOrchestrator,
    pub store: Arc<dyn AuditStore>,
    pub events: BroadcastEventBus,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn AuditStore>) -> anyhow::Result<Self> {
        let events = BroadcastEventBus::default();
        let orchestrator =
            AuditOrchestrator::from_config(config, store.clone(), Arc::new(events.clone()))?;
        Ok(Self {
            orchestrator,
            store,
            events,
        })
    }
}

/// Open the configured store, or a throwaway in-memory one.
pub async fn open_store(config: &Config, memory: bool) -> anyhow::Result<Arc<dyn AuditStore>> {
    if memory {
        tracing::warn!("Using in-memory store; nothing will be persisted");
        return Ok(Arc::new(MemoryAuditStore::new()));
    }
    let store = SqliteAuditStore::open(&config.database_url()).await?;
    Ok(Arc::new(store))
}

/// Start the web server.
pub async fn serve(config: &Config, bind: &str, memory: bool) -> anyhow::Result<()> {
    let store = open_store(config, memory).await?;
    let state = AppState::new(config, store)?;
    let app = create_router(state);

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
