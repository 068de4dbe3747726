//! End-to-end audit runs over fake browser, probe, and grader doubles.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use url::Url;

use siteaudit::audit::compliance::{DomSignalExtractor, OriginProbe};
use siteaudit::audit::performance::{GraderError, PerformanceGrader};
use siteaudit::audit::{ComplianceAuditor, PerformanceAuditor};
use siteaudit::browser::{BrowserError, BrowserLauncher, BrowserPage, BrowserSession, PageProfile};
use siteaudit::config::Config;
use siteaudit::discovery::LinkDiscoverer;
use siteaudit::events::AuditEventSink;
use siteaudit::models::{
    AuditEvent, AuditKind, Chatbot, ComplianceRecord, EventKind, PerformanceRecord, Subscription,
    Tier,
};
use siteaudit::repository::{AuditStore, MemoryAuditStore, StoreError, StoreResult};
use siteaudit::{AuditError, AuditOrchestrator, RunOutcome};

const BASE: &str = "https://example.com";

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, String>,
    timeouts: HashSet<String>,
}

impl FakeSite {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn timing_out(mut self, url: &str) -> Self {
        self.timeouts.insert(url.to_string());
        self
    }
}

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    shutdowns: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

struct FakeLauncher {
    site: Arc<FakeSite>,
    counters: Arc<Counters>,
    fail: bool,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BrowserError::Launch("chromium not found".into()));
        }
        Ok(Arc::new(FakeSession {
            site: self.site.clone(),
            counters: self.counters.clone(),
        }))
    }
}

struct FakeSession {
    site: Arc<FakeSite>,
    counters: Arc<Counters>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn open_page(&self, _profile: PageProfile) -> Result<Box<dyn BrowserPage>, BrowserError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            site: self.site.clone(),
            counters: self.counters.clone(),
            current: Mutex::new(None),
        }))
    }

    async fn shutdown(&self) {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakePage {
    site: Arc<FakeSite>,
    counters: Arc<Counters>,
    current: Mutex<Option<String>>,
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.site.timeouts.contains(url) {
            return Err(BrowserError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            });
        }
        if !self.site.pages.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for(&self, _predicate: &str, _timeout: Duration) -> bool {
        true
    }

    async fn url(&self) -> Result<String, BrowserError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrowserError::Page("no page loaded".into()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let url = self.url().await?;
        Ok(self.site.pages.get(&url).cloned().unwrap_or_default())
    }

    async fn close(self: Box<Self>) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct AlwaysFound;

#[async_trait]
impl OriginProbe for AlwaysFound {
    async fn status(&self, _page_url: &Url, _path: &str) -> Option<u16> {
        Some(200)
    }
}

#[derive(Default)]
struct FakeGrader {
    payloads: HashMap<String, Value>,
}

#[async_trait]
impl PerformanceGrader for FakeGrader {
    async fn grade(&self, url: &str) -> Result<Value, GraderError> {
        self.payloads
            .get(url)
            .cloned()
            .ok_or(GraderError::Status(500))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl AuditEventSink for RecordingSink {
    async fn publish(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Memory store whose trigger counter cannot be written.
struct CounterDown {
    inner: MemoryAuditStore,
}

#[async_trait]
impl AuditStore for CounterDown {
    async fn get_chatbot(&self, chatbot_id: &str) -> StoreResult<Option<Chatbot>> {
        self.inner.get_chatbot(chatbot_id).await
    }

    async fn save_chatbot(&self, chatbot: &Chatbot) -> StoreResult<()> {
        self.inner.save_chatbot(chatbot).await
    }

    async fn get_subscription(&self, organization_id: &str) -> StoreResult<Option<Subscription>> {
        self.inner.get_subscription(organization_id).await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.inner.save_subscription(subscription).await
    }

    async fn reset_trigger_count(&self, organization_id: &str, kind: AuditKind) -> StoreResult<()> {
        self.inner.reset_trigger_count(organization_id, kind).await
    }

    async fn increment_trigger_count(
        &self,
        _organization_id: &str,
        _kind: AuditKind,
    ) -> StoreResult<u32> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }

    async fn find_compliance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<ComplianceRecord>> {
        self.inner.find_compliance(chatbot_id, base_url).await
    }

    async fn latest_compliance(&self, chatbot_id: &str) -> StoreResult<Option<ComplianceRecord>> {
        self.inner.latest_compliance(chatbot_id).await
    }

    async fn save_compliance(&self, record: &ComplianceRecord) -> StoreResult<()> {
        self.inner.save_compliance(record).await
    }

    async fn find_performance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        self.inner.find_performance(chatbot_id, base_url).await
    }

    async fn latest_performance(
        &self,
        chatbot_id: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        self.inner.latest_performance(chatbot_id).await
    }

    async fn save_performance(&self, record: &PerformanceRecord) -> StoreResult<()> {
        self.inner.save_performance(record).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Harness {
    orchestrator: AuditOrchestrator,
    store: Arc<MemoryAuditStore>,
    sink: Arc<RecordingSink>,
    counters: Arc<Counters>,
}

struct Setup {
    site: FakeSite,
    grader: FakeGrader,
    tier: Tier,
    launch_fails: bool,
    counter_fails: bool,
    concurrency: usize,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            site: FakeSite::default(),
            grader: FakeGrader::default(),
            tier: Tier::Trial,
            launch_fails: false,
            counter_fails: false,
            concurrency: 1,
        }
    }
}

async fn harness(setup: Setup) -> Harness {
    let mut config = Config::default();
    config.compliance.concurrency = setup.concurrency;
    config.performance.concurrency = setup.concurrency;

    let store = Arc::new(MemoryAuditStore::new());
    store.save_chatbot(&Chatbot::new("bot-1", "org-1")).await.unwrap();
    store
        .save_subscription(&Subscription::new("org-1", setup.tier))
        .await
        .unwrap();
    store
        .save_compliance(&ComplianceRecord::new("bot-1", BASE))
        .await
        .unwrap();
    store
        .save_performance(&PerformanceRecord::new("bot-1", BASE))
        .await
        .unwrap();

    let counters = Arc::new(Counters::default());
    let sink = Arc::new(RecordingSink::default());

    let backing: Arc<dyn AuditStore> = if setup.counter_fails {
        Arc::new(CounterDown {
            inner: (*store).clone(),
        })
    } else {
        store.clone()
    };

    let orchestrator = AuditOrchestrator::new(
        backing,
        Arc::new(FakeLauncher {
            site: Arc::new(setup.site),
            counters: counters.clone(),
            fail: setup.launch_fails,
        }),
        sink.clone(),
        LinkDiscoverer::new(config.discovery.clone()),
        ComplianceAuditor::new(
            config.compliance.clone(),
            Arc::new(DomSignalExtractor),
            Arc::new(AlwaysFound),
        ),
        PerformanceAuditor::new(config.performance.clone(), Arc::new(setup.grader)),
        config.quota.window_days,
    );

    Harness {
        orchestrator,
        store,
        sink,
        counters,
    }
}

fn home_page() -> String {
    r#"<html><head><title>Example Home Page</title></head>
       <body><h1>Welcome</h1>
         <a href="/">Home</a>
         <a href="/about#team">About</a>
         <a href="/about">About again</a>
         <a href="/pricing">Pricing</a>
         <a href="https://other.example.org/">Elsewhere</a>
       </body></html>"#
        .to_string()
}

fn content_page(title: &str) -> String {
    format!(
        r#"<html><head><title>{}</title><meta name="viewport" content="width=device-width"></head>
           <body><h1>{}</h1><p>Some words here.</p><img src="/hero.webp" alt="hero"></body></html>"#,
        title, title
    )
}

fn three_page_site() -> FakeSite {
    FakeSite::default()
        .page("https://example.com/", &home_page())
        .page("https://example.com/about", &content_page("About the example company"))
        .page("https://example.com/pricing", &content_page("Pricing for every team"))
}

fn perf_payload(score: f64, fcp: &str) -> Value {
    json!({
        "lighthouseResult": {
            "categories": {
                "performance": {"score": score},
                "accessibility": {"score": 0.8},
                "best-practices": {"score": 1},
                "seo": {"score": 0.9}
            },
            "audits": {
                "first-contentful-paint": {"id": "first-contentful-paint", "displayValue": fcp, "score": 0.9, "scoreDisplayMode": "numeric"},
                "render-blocking-resources": {
                    "id": "render-blocking-resources",
                    "title": "Eliminate render-blocking resources",
                    "description": "Resources are blocking the first paint.",
                    "score": 0.5,
                    "scoreDisplayMode": "metricSavings",
                    "details": {"type": "opportunity", "overallSavingsMs": 800, "items": [{}]}
                }
            }
        }
    })
}

async fn finish(outcome: siteaudit::TriggerAck) -> RunOutcome {
    outcome.handle.await.expect("run task panicked")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trial_tenant_second_trigger_in_window_is_denied() {
    let h = harness(Setup {
        site: three_page_site(),
        ..Default::default()
    })
    .await;

    let ack = h.orchestrator.trigger_compliance("bot-1").await.unwrap();
    assert_eq!(ack.message, "SEO compliance audit started.");
    let outcome = finish(ack).await;
    assert!(outcome.is_completed());
    assert_eq!(
        h.sink.kinds(),
        vec![EventKind::Started, EventKind::Completed]
    );

    let second = h.orchestrator.trigger_compliance("bot-1").await;
    match second {
        Err(AuditError::QuotaExceeded { message }) => {
            assert!(message.contains("1/week for Trial plan"), "{}", message);
        }
        other => panic!("expected QuotaExceeded, got {:?}", other.map(|a| a.message)),
    }

    let last = h.sink.events().pop().unwrap();
    assert_eq!(last.kind, EventKind::Error);
    assert!(last.message.contains("1/week for Trial plan"));
    assert_eq!(last.topic(), "seo:compliance:error:org-1");

    let sub = h.store.get_subscription("org-1").await.unwrap().unwrap();
    assert_eq!(sub.compliance_trigger_count, 1);
}

#[tokio::test]
async fn completed_run_persists_record_and_estimates_duration() {
    let h = harness(Setup {
        site: three_page_site(),
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    let RunOutcome::Completed(data) = outcome else {
        panic!("run failed");
    };
    assert_eq!(data["totalChecks"], 15);

    let started = &h.sink.events()[0];
    // Three internal links at 25 seconds per page
    assert_eq!(started.estimated_seconds, Some(75));

    let record = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    assert!(record.updated_at.is_some());
    assert_eq!(record.total_checks, 15);
    assert!(record.seo_score.unwrap().ends_with('%'));

    let completed = h.sink.events().pop().unwrap();
    assert_eq!(completed.data.unwrap()["seoScore"], data["seoScore"]);
}

#[tokio::test]
async fn one_page_timing_out_is_excluded() {
    let h = harness(Setup {
        site: three_page_site().timing_out("https://example.com/pricing"),
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    let RunOutcome::Completed(data) = outcome else {
        panic!("run failed");
    };
    assert_eq!(data["totalChecks"], 15);

    // Every opened page was closed, including the one that timed out
    assert_eq!(
        h.counters.opened.load(Ordering::SeqCst),
        h.counters.closed.load(Ordering::SeqCst)
    );
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_discovered_links_fails_without_touching_record() {
    let site = FakeSite::default().page(
        "https://example.com/",
        "<html><body><div id=\"app\"></div></body></html>",
    );
    let h = harness(Setup {
        site,
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(AuditError::AllAuditsFailed("Compliance"))
    ));

    let last = h.sink.events().pop().unwrap();
    assert_eq!(last.kind, EventKind::Error);
    assert_eq!(last.message, "Compliance audit failed. No successful results.");

    let record = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    assert!(record.updated_at.is_none());
    assert!(record.seo_score.is_none());

    // Failed runs never consume quota
    let sub = h.store.get_subscription("org-1").await.unwrap().unwrap();
    assert_eq!(sub.compliance_trigger_count, 0);
    assert_eq!(h.orchestrator.quota().pending("org-1", AuditKind::Compliance), 0);
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_run_keeps_previous_audit() {
    let site = FakeSite::default().page(
        "https://example.com/",
        "<html><body><div id=\"app\"></div></body></html>",
    );
    let h = harness(Setup {
        site,
        tier: Tier::Growth,
        ..Default::default()
    })
    .await;

    let audited = Utc::now() - chrono::Duration::days(2);
    let mut previous = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    previous.seo_score = Some("87%".into());
    previous.total_checks = 15;
    previous.updated_at = Some(audited);
    h.store.save_compliance(&previous).await.unwrap();

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(!outcome.is_completed());

    let record = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    assert_eq!(record.seo_score.as_deref(), Some("87%"));
    assert_eq!(record.total_checks, 15);
    assert_eq!(record.updated_at, Some(audited));
}

#[tokio::test]
async fn uncounted_run_completes_with_quota_error() {
    let h = harness(Setup {
        site: three_page_site(),
        counter_fails: true,
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(outcome.is_completed());

    let record = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    assert!(record.updated_at.is_some());

    let completed = h.sink.events().pop().unwrap();
    assert_eq!(completed.kind, EventKind::Completed);
    let detail = completed.error.expect("quota failure should be reported");
    assert!(detail.contains("weekly quota"), "{}", detail);
    assert!(detail.contains("disk full"), "{}", detail);
    assert_eq!(h.orchestrator.quota().pending("org-1", AuditKind::Compliance), 0);
}

#[tokio::test]
async fn browser_launch_failure_is_reported_through_events() {
    let h = harness(Setup {
        launch_fails: true,
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(AuditError::BrowserLaunchFailure(_))
    ));

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Error);
    assert!(events[0].error.as_deref().unwrap().contains("chromium not found"));

    // A fresh trigger is allowed since nothing was counted
    assert!(h.orchestrator.trigger_compliance("bot-1").await.is_ok());
}

#[tokio::test]
async fn discovery_navigation_failure_releases_browser() {
    let h = harness(Setup {
        site: FakeSite::default().timing_out("https://example.com/"),
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(AuditError::BrowserLaunchFailure(_))
    ));
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(h.sink.kinds(), vec![EventKind::Error]);
}

#[tokio::test]
async fn validation_errors_are_synchronous() {
    let h = harness(Setup::default()).await;

    assert!(matches!(
        h.orchestrator.trigger_compliance("ghost").await,
        Err(AuditError::ChatbotNotFound)
    ));

    h.store
        .save_chatbot(&Chatbot::new("bot-2", "org-1"))
        .await
        .unwrap();
    assert!(matches!(
        h.orchestrator.trigger_performance("bot-2").await,
        Err(AuditError::BaseUrlNotConfigured)
    ));

    h.store
        .save_chatbot(&Chatbot::new("bot-3", "org-unknown"))
        .await
        .unwrap();
    h.store
        .save_compliance(&ComplianceRecord::new("bot-3", BASE))
        .await
        .unwrap();
    assert!(matches!(
        h.orchestrator.trigger_compliance("bot-3").await,
        Err(AuditError::SubscriptionNotFound)
    ));

    assert!(h.sink.events().is_empty());
    assert_eq!(h.counters.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stale_window_resets_count_before_check() {
    let h = harness(Setup {
        site: three_page_site(),
        ..Default::default()
    })
    .await;

    let mut sub = h.store.get_subscription("org-1").await.unwrap().unwrap();
    sub.compliance_trigger_count = 1;
    h.store.save_subscription(&sub).await.unwrap();

    let mut record = h.store.latest_compliance("bot-1").await.unwrap().unwrap();
    record.updated_at = Some(Utc::now() - chrono::Duration::days(8));
    h.store.save_compliance(&record).await.unwrap();

    let outcome = finish(h.orchestrator.trigger_compliance("bot-1").await.unwrap()).await;
    assert!(outcome.is_completed());

    let sub = h.store.get_subscription("org-1").await.unwrap().unwrap();
    assert_eq!(sub.compliance_trigger_count, 1);
}

#[tokio::test]
async fn concurrent_triggers_share_one_slot() {
    let h = harness(Setup {
        site: three_page_site(),
        ..Default::default()
    })
    .await;

    let first = h.orchestrator.trigger_compliance("bot-1").await.unwrap();
    let second = h.orchestrator.trigger_compliance("bot-1").await;
    assert!(matches!(second, Err(AuditError::QuotaExceeded { .. })));
    assert!(finish(first).await.is_completed());
}

#[tokio::test]
async fn performance_run_averages_and_dedupes() {
    let mut grader = FakeGrader::default();
    grader
        .payloads
        .insert("https://example.com/".into(), perf_payload(0.8, "1.0 s"));
    grader
        .payloads
        .insert("https://example.com/about".into(), perf_payload(0.6, "3.0 s"));
    // /pricing has no payload: the grading service fails for it

    let h = harness(Setup {
        site: three_page_site(),
        grader,
        tier: Tier::Growth,
        concurrency: 3,
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_performance("bot-1").await.unwrap()).await;
    let RunOutcome::Completed(data) = outcome else {
        panic!("run failed");
    };

    assert_eq!(data["overallScore"]["performance"], 70);
    assert_eq!(data["metrics"]["fcp"], "2s");
    let opportunities = data["opportunities"].as_array().unwrap();
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0]["title"], "Eliminate render-blocking resources");

    let started = &h.sink.events()[0];
    assert_eq!(started.estimated_seconds, Some(90));
    assert_eq!(started.topic(), "seo:performance:started:org-1");

    let sub = h.store.get_subscription("org-1").await.unwrap().unwrap();
    assert_eq!(sub.performance_trigger_count, 1);
    assert_eq!(sub.compliance_trigger_count, 0);
}

#[tokio::test]
async fn performance_all_pages_failing() {
    let h = harness(Setup {
        site: three_page_site(),
        ..Default::default()
    })
    .await;

    let outcome = finish(h.orchestrator.trigger_performance("bot-1").await.unwrap()).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(AuditError::AllAuditsFailed("Performance"))
    ));
    let record = h.store.latest_performance("bot-1").await.unwrap().unwrap();
    assert!(record.overall_score.is_none());
}
