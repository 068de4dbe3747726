//! Web server command.

use console::style;

use siteaudit::config::{Config, DEFAULT_BIND};

/// Start the web server.
pub async fn cmd_serve(config: &Config, bind: Option<String>, memory: bool) -> anyhow::Result<()> {
    let bind = match bind {
        Some(b) => parse_bind_address(&b),
        None => config.bind_address().to_string(),
    };

    if !memory {
        println!(
            "{} Using database {}",
            style("→").cyan(),
            config.database_url()
        );
    }

    println!(
        "{} Starting siteaudit server at http://{}",
        style("→").cyan(),
        bind
    );
    println!("  Press Ctrl+C to stop");

    siteaudit::server::serve(config, &bind, memory).await
}

/// Parse a bind address that can be:
/// - Just a port: "3040" -> 127.0.0.1:3040
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3040
/// - Host and port: "0.0.0.0:3040" -> 0.0.0.0:3040
fn parse_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }

    if let Some((_, port_str)) = bind.rsplit_once(':') {
        if port_str.parse::<u16>().is_ok() {
            return bind.to_string();
        }
    }

    let default_port = DEFAULT_BIND
        .rsplit_once(':')
        .map(|(_, p)| p)
        .unwrap_or("3040");
    format!("{}:{}", bind, default_port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(parse_bind_address("8080"), "127.0.0.1:8080");
        assert_eq!(parse_bind_address("0.0.0.0"), "0.0.0.0:3040");
        assert_eq!(parse_bind_address("0.0.0.0:9000"), "0.0.0.0:9000");
    }
}
