//! Chatbot and subscription management.

use console::style;

use siteaudit::config::Config;
use siteaudit::models::{Chatbot, Subscription};
use siteaudit::server::open_store;

use super::TenantCommands;

pub async fn cmd_tenant(config: &Config, command: TenantCommands) -> anyhow::Result<()> {
    match command {
        TenantCommands::Add {
            chatbot_id,
            org,
            tier,
        } => {
            let store = open_store(config, false).await?;
            store.save_chatbot(&Chatbot::new(&chatbot_id, &org)).await?;

            // Keep existing counters when only the tier changes
            let subscription = match store.get_subscription(&org).await? {
                Some(mut existing) => {
                    existing.tier = tier.as_str().to_string();
                    existing
                }
                None => Subscription::new(&org, tier),
            };
            store.save_subscription(&subscription).await?;

            println!(
                "{} Chatbot {} added to {} ({} plan, {}/week per audit type)",
                style("✓").green(),
                style(&chatbot_id).cyan(),
                org,
                subscription.tier_name(),
                subscription.weekly_limit()
            );
        }
    }
    Ok(())
}
