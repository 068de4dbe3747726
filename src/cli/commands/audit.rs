//! Run audits from the command line and show stored results.

use std::sync::Arc;

use console::style;

use siteaudit::config::Config;
use siteaudit::events::{next_for_org, BroadcastEventBus};
use siteaudit::models::{AuditEvent, AuditKind, EventKind};
use siteaudit::orchestrator::{AuditOrchestrator, RunOutcome};
use siteaudit::server::open_store;

fn print_event(event: &AuditEvent, kind: AuditKind) {
    if event.audit != kind {
        return;
    }
    match event.kind {
        EventKind::Started => {
            let eta = event.estimated_seconds.unwrap_or(0);
            println!(
                "{} {} (estimated {}m {}s)",
                style("→").cyan(),
                event.message,
                eta / 60,
                eta % 60
            );
        }
        EventKind::Completed => {
            println!("{} {}", style("✓").green(), event.message);
            if let Some(detail) = &event.error {
                eprintln!("{} {}", style("!").yellow(), detail);
            }
        }
        EventKind::Error => match &event.error {
            Some(detail) => eprintln!("{} {}: {}", style("✗").red(), event.message, detail),
            None => eprintln!("{} {}", style("✗").red(), event.message),
        },
    }
}

/// Trigger an audit and wait for its terminal event.
pub async fn cmd_audit(config: &Config, kind: AuditKind, chatbot_id: &str) -> anyhow::Result<()> {
    let store = open_store(config, false).await?;
    let bus = BroadcastEventBus::default();
    let orchestrator = AuditOrchestrator::from_config(config, store, Arc::new(bus.clone()))?;

    // Subscribe before triggering so no event is missed
    let mut events = bus.subscribe();

    let ack = match orchestrator.trigger(kind, chatbot_id).await {
        Ok(ack) => ack,
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            return Err(e.into());
        }
    };
    println!("{} {}", style("→").cyan(), ack.message);

    let org = ack.organization_id;
    let mut handle = ack.handle;

    let outcome = loop {
        tokio::select! {
            event = next_for_org(&mut events, &org) => match event {
                Some(event) => print_event(&event, kind),
                None => break (&mut handle).await?,
            },
            outcome = &mut handle => {
                // Flush anything published just before the run returned
                while let Ok(event) = events.try_recv() {
                    if event.organization_id == org {
                        print_event(&event, kind);
                    }
                }
                break outcome?;
            }
        }
    };

    match outcome {
        RunOutcome::Completed(record) => {
            let score = match kind {
                AuditKind::Compliance => record["seoScore"].as_str().map(str::to_string),
                AuditKind::Performance => record["overallScore"]["performance"]
                    .as_u64()
                    .map(|p| format!("{}/100", p)),
            };
            if let Some(score) = score {
                println!("  Score: {}", style(score).bold());
            }
            Ok(())
        }
        RunOutcome::Failed(e) => Err(e.into()),
    }
}

/// Print the latest audited record as JSON.
pub async fn cmd_show(config: &Config, kind: AuditKind, chatbot_id: &str) -> anyhow::Result<()> {
    let store = open_store(config, false).await?;

    let json = match kind {
        AuditKind::Compliance => store
            .latest_compliance(chatbot_id)
            .await?
            .filter(|r| r.updated_at.is_some())
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        AuditKind::Performance => store
            .latest_performance(chatbot_id)
            .await?
            .filter(|r| r.updated_at.is_some())
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
    };

    match json {
        Some(json) => {
            println!("{}", json);
            Ok(())
        }
        None => {
            println!(
                "{} No {} audit found for {}",
                style("!").yellow(),
                kind,
                chatbot_id
            );
            Ok(())
        }
    }
}
