//! Site registration command.

use console::style;

use siteaudit::config::Config;
use siteaudit::server::open_store;
use siteaudit::sites::register_base_url;

use super::SiteCommands;

pub async fn cmd_site(config: &Config, command: SiteCommands) -> anyhow::Result<()> {
    match command {
        SiteCommands::Register { chatbot_id, url } => {
            let store = open_store(config, false).await?;
            match register_base_url(store.as_ref(), &chatbot_id, &url).await {
                Ok(site) => {
                    println!(
                        "{} Registered {} for chatbot {}",
                        style("✓").green(),
                        style(&site.compliance.base_url).cyan(),
                        chatbot_id
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{} {}", style("✗").red(), e);
                    Err(e.into())
                }
            }
        }
    }
}
