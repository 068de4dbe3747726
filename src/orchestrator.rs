//! Audit run state machine.
//!
//! A trigger validates synchronously and acknowledges; the run itself is
//! detached onto the runtime and reports only through the event sink.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditPipeline, ComplianceAuditor, PerformanceAuditor};
use crate::browser::{BrowserLauncher, BrowserSession, ChromiumLauncher};
use crate::config::Config;
use crate::discovery::LinkDiscoverer;
use crate::error::{AuditError, AuditResult};
use crate::events::AuditEventSink;
use crate::models::{AuditEvent, AuditKind};
use crate::pool::WorkerPool;
use crate::quota::{QuotaLedger, QuotaReservation};
use crate::repository::AuditStore;

/// Run states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Discovering,
    AuditingPages,
    Aggregating,
    Persisting,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Discovering => "discovering",
            Self::AuditingPages => "auditing_pages",
            Self::Aggregating => "aggregating",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Terminal result of a detached run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The updated record as JSON.
    Completed(serde_json::Value),
    Failed(AuditError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Synchronous acknowledgment of an accepted trigger.
#[derive(Debug)]
pub struct TriggerAck {
    pub message: String,
    pub organization_id: String,
    pub handle: JoinHandle<RunOutcome>,
}

/// Everything a run needs after validation.
#[derive(Debug, Clone)]
struct RunContext {
    kind: AuditKind,
    chatbot_id: String,
    organization_id: String,
    base_url: String,
}

impl RunContext {
    fn log_state(&self, state: RunState) {
        info!(
            "{} audit chatbot={} org={} state={}",
            self.kind,
            self.chatbot_id,
            self.organization_id,
            state.as_str()
        );
    }
}

#[derive(Clone)]
pub struct AuditOrchestrator {
    store: Arc<dyn AuditStore>,
    launcher: Arc<dyn BrowserLauncher>,
    events: Arc<dyn AuditEventSink>,
    discoverer: Arc<LinkDiscoverer>,
    compliance: Arc<ComplianceAuditor>,
    performance: Arc<PerformanceAuditor>,
    quota: QuotaLedger,
}

impl AuditOrchestrator {
    pub fn new(
        store: Arc<dyn AuditStore>,
        launcher: Arc<dyn BrowserLauncher>,
        events: Arc<dyn AuditEventSink>,
        discoverer: LinkDiscoverer,
        compliance: ComplianceAuditor,
        performance: PerformanceAuditor,
        quota_window_days: i64,
    ) -> Self {
        let quota = QuotaLedger::new(store.clone(), quota_window_days);
        Self {
            store,
            launcher,
            events,
            discoverer: Arc::new(discoverer),
            compliance: Arc::new(compliance),
            performance: Arc::new(performance),
            quota,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn AuditStore>,
        events: Arc<dyn AuditEventSink>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            store,
            Arc::new(ChromiumLauncher::new(config.browser.clone())),
            events,
            LinkDiscoverer::new(config.discovery.clone()),
            ComplianceAuditor::from_config(config.compliance.clone())?,
            PerformanceAuditor::from_config(config.performance.clone())?,
            config.quota.window_days,
        ))
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    pub fn quota(&self) -> &QuotaLedger {
        &self.quota
    }

    pub async fn trigger(&self, kind: AuditKind, chatbot_id: &str) -> AuditResult<TriggerAck> {
        match kind {
            AuditKind::Compliance => self.trigger_compliance(chatbot_id).await,
            AuditKind::Performance => self.trigger_performance(chatbot_id).await,
        }
    }

    pub async fn trigger_compliance(&self, chatbot_id: &str) -> AuditResult<TriggerAck> {
        self.start(self.compliance.clone(), chatbot_id).await
    }

    pub async fn trigger_performance(&self, chatbot_id: &str) -> AuditResult<TriggerAck> {
        self.start(self.performance.clone(), chatbot_id).await
    }

    /// Validate, reserve quota, and detach the run.
    async fn start<P: AuditPipeline>(
        &self,
        pipeline: Arc<P>,
        chatbot_id: &str,
    ) -> AuditResult<TriggerAck> {
        let kind = pipeline.kind();
        debug!("{} trigger for chatbot {}: {}", kind, chatbot_id, RunState::Validating.as_str());

        let chatbot = self
            .store
            .get_chatbot(chatbot_id)
            .await?
            .ok_or(AuditError::ChatbotNotFound)?;

        let base_url = self
            .configured_site(kind, chatbot_id)
            .await?
            .ok_or(AuditError::BaseUrlNotConfigured)?;

        if self
            .store
            .get_subscription(&chatbot.organization_id)
            .await?
            .is_none()
        {
            return Err(AuditError::SubscriptionNotFound);
        }

        let reservation = match self
            .quota
            .check_and_reserve(&chatbot.organization_id, chatbot_id, kind, Utc::now())
            .await
        {
            Ok(reservation) => reservation,
            Err(AuditError::QuotaExceeded { message }) => {
                warn!("{} quota denied for {}: {}", kind, chatbot.organization_id, message);
                self.events
                    .publish(AuditEvent::error(
                        kind,
                        &chatbot.organization_id,
                        Some(chatbot_id),
                        message.clone(),
                        None,
                    ))
                    .await;
                return Err(AuditError::QuotaExceeded { message });
            }
            Err(e) => return Err(e),
        };

        let ctx = RunContext {
            kind,
            chatbot_id: chatbot.chatbot_id.clone(),
            organization_id: chatbot.organization_id.clone(),
            base_url,
        };
        info!(
            "SEO {} audit started for org {} ({})",
            kind, ctx.organization_id, ctx.base_url
        );

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(pipeline, ctx, reservation).await });

        Ok(TriggerAck {
            message: format!("SEO {} audit started.", kind),
            organization_id: chatbot.organization_id,
            handle,
        })
    }

    /// Base URL of the most recently configured record.
    async fn configured_site(
        &self,
        kind: AuditKind,
        chatbot_id: &str,
    ) -> AuditResult<Option<String>> {
        let base_url = match kind {
            AuditKind::Compliance => self
                .store
                .latest_compliance(chatbot_id)
                .await?
                .map(|r| r.base_url),
            AuditKind::Performance => self
                .store
                .latest_performance(chatbot_id)
                .await?
                .map(|r| r.base_url),
        };
        Ok(base_url.filter(|base_url| !base_url.is_empty()))
    }

    async fn run<P: AuditPipeline>(
        &self,
        pipeline: Arc<P>,
        ctx: RunContext,
        reservation: QuotaReservation,
    ) -> RunOutcome {
        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => return self.fail(&ctx, AuditError::from(e)).await,
        };

        let result = self.drive(&pipeline, &ctx, &session, reservation).await;

        // Always release the browser
        session.shutdown().await;

        match result {
            Ok((record, quota_error)) => {
                ctx.log_state(RunState::Completed);
                let mut event = AuditEvent::completed(
                    ctx.kind,
                    &ctx.organization_id,
                    &ctx.chatbot_id,
                    record.clone(),
                );
                event.error = quota_error;
                self.events.publish(event).await;
                RunOutcome::Completed(record)
            }
            Err(e) => self.fail(&ctx, e).await,
        }
    }

    async fn drive<P: AuditPipeline>(
        &self,
        pipeline: &Arc<P>,
        ctx: &RunContext,
        session: &Arc<dyn BrowserSession>,
        reservation: QuotaReservation,
    ) -> AuditResult<(serde_json::Value, Option<String>)> {
        ctx.log_state(RunState::Discovering);
        let links = self.discoverer.discover(session, &ctx.base_url).await?;

        let estimate = links.len() as u64 * pipeline.seconds_per_page();
        self.events
            .publish(AuditEvent::started(
                ctx.kind,
                &ctx.organization_id,
                &ctx.chatbot_id,
                estimate,
            ))
            .await;

        ctx.log_state(RunState::AuditingPages);
        let workers = WorkerPool::new(pipeline.concurrency());
        let total = links.len();
        let job_pipeline = pipeline.clone();
        let job_session = session.clone();
        let results = workers
            .run_all(links, move |url: String| {
                let pipeline = job_pipeline.clone();
                let session = job_session.clone();
                async move {
                    let result = pipeline.audit_page(session, url.clone()).await;
                    (url, result)
                }
            })
            .await;

        let mut pages = Vec::with_capacity(results.len());
        for (url, result) in results {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => warn!("{} audit failed for {}: {}", ctx.kind, url, e),
            }
        }
        info!(
            "{} audit for {}: {}/{} pages succeeded",
            ctx.kind,
            ctx.base_url,
            pages.len(),
            total
        );

        ctx.log_state(RunState::Aggregating);
        let summary = pipeline
            .summarize(&pages)
            .ok_or(AuditError::AllAuditsFailed(ctx.kind.label()))?;

        ctx.log_state(RunState::Persisting);
        let record = pipeline
            .persist(self.store.as_ref(), &ctx.chatbot_id, &ctx.base_url, summary)
            .await?;

        // Record is already written; a counter failure rides on the completed event
        let quota_error = match reservation.commit().await {
            Ok(count) => {
                debug!(
                    "{} trigger count for {} is now {}",
                    ctx.kind, ctx.organization_id, count
                );
                None
            }
            Err(e) => {
                error!(
                    "Audit persisted but {} trigger for {} was not counted: {}",
                    ctx.kind, ctx.organization_id, e
                );
                Some(format!("Failed to record audit against weekly quota: {}", e))
            }
        };

        Ok((record, quota_error))
    }

    async fn fail(&self, ctx: &RunContext, err: AuditError) -> RunOutcome {
        ctx.log_state(RunState::Failed);
        error!("SEO {} error for {}: {}", ctx.kind, ctx.organization_id, err);

        let event = match &err {
            AuditError::AllAuditsFailed(_) => AuditEvent::error(
                ctx.kind,
                &ctx.organization_id,
                Some(&ctx.chatbot_id),
                err.to_string(),
                None,
            ),
            other => AuditEvent::error(
                ctx.kind,
                &ctx.organization_id,
                Some(&ctx.chatbot_id),
                format!("SEO {} audit failed.", ctx.kind),
                Some(other.to_string()),
            ),
        };
        self.events.publish(event).await;
        RunOutcome::Failed(err)
    }
}
