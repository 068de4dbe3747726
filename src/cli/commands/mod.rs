//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod audit;
mod serve;
mod site;
mod tenant;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use siteaudit::config::Config;
use siteaudit::models::{AuditKind, Tier};

#[derive(Parser)]
#[command(name = "siteaudit")]
#[command(about = "SEO compliance and performance audit engine")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Audit kind as a CLI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Compliance,
    Performance,
}

impl From<KindArg> for AuditKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Compliance => AuditKind::Compliance,
            KindArg::Performance => AuditKind::Performance,
        }
    }
}

fn parse_tier(s: &str) -> Result<Tier, String> {
    Tier::from_str(s).ok_or_else(|| {
        format!(
            "unknown tier '{}' (expected Trial, Free, Starter, Growth, or Scale)",
            s
        )
    })
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config, 127.0.0.1:3040)
        #[arg(short, long)]
        bind: Option<String>,
        /// Keep everything in memory instead of the SQLite database
        #[arg(long)]
        memory: bool,
    },

    /// Manage chatbots and their subscriptions
    Tenant {
        #[command(subcommand)]
        command: TenantCommands,
    },

    /// Manage registered sites
    Site {
        #[command(subcommand)]
        command: SiteCommands,
    },

    /// Run an audit and follow it until it finishes
    Audit {
        /// Audit type
        #[arg(value_enum)]
        kind: KindArg,
        /// Chatbot whose site is audited
        chatbot_id: String,
    },

    /// Print the latest audited record
    Show {
        /// Audit type
        #[arg(value_enum)]
        kind: KindArg,
        chatbot_id: String,
    },
}

#[derive(Subcommand)]
pub enum TenantCommands {
    /// Add or update a chatbot and its organization's subscription
    Add {
        chatbot_id: String,
        /// Owning organization
        #[arg(long)]
        org: String,
        /// Subscription tier
        #[arg(long, default_value = "Trial", value_parser = parse_tier)]
        tier: Tier,
    },
}

#[derive(Subcommand)]
pub enum SiteCommands {
    /// Register a chatbot's base URL
    Register { chatbot_id: String, url: String },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    match cli.command {
        Commands::Serve { bind, memory } => serve::cmd_serve(&config, bind, memory).await,
        Commands::Tenant { command } => tenant::cmd_tenant(&config, command).await,
        Commands::Site { command } => site::cmd_site(&config, command).await,
        Commands::Audit { kind, chatbot_id } => {
            audit::cmd_audit(&config, kind.into(), &chatbot_id).await
        }
        Commands::Show { kind, chatbot_id } => {
            audit::cmd_show(&config, kind.into(), &chatbot_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!(parse_tier("Growth"), Ok(Tier::Growth));
        assert!(parse_tier("Enterprise").is_err());
    }

    #[test]
    fn test_parse_audit_command() {
        let cli = Cli::try_parse_from(["siteaudit", "audit", "performance", "bot-1"]).unwrap();
        match cli.command {
            Commands::Audit { kind, chatbot_id } => {
                assert_eq!(AuditKind::from(kind), AuditKind::Performance);
                assert_eq!(chatbot_id, "bot-1");
            }
            _ => panic!("expected audit command"),
        }
    }
}
