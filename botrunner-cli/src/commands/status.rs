//! botrunner status: query a running server

use anyhow::{Context, Result};
use botrunner_core::BotStatus;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Base URL of the server (defaults to the configured host and port)
    #[arg(long)]
    pub url: Option<String>,

    /// Print the raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let base = match args.url {
        Some(url) => url,
        None => ConfigLoader::load()?.server.base_url(),
    };
    let url = format!("{}/bot_status", base.trim_end_matches('/'));

    let status: BotStatus = reqwest::get(&url)
        .await
        .with_context(|| format!("Could not reach {}", url))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected status response")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", render(&status));
    }
    Ok(())
}

fn render(status: &BotStatus) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Field").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
    ]);

    let running = if status.running {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::Red)
    };
    table.add_row(vec![Cell::new("Running"), running]);
    table.add_row(vec!["Phase", status.phase.as_str()]);
    table.add_row(vec!["Token held", if status.has_token { "yes" } else { "no" }]);

    if let Some(info) = &status.info {
        table.add_row(vec!["Name".to_string(), info.name.clone()]);
        table.add_row(vec!["ID".to_string(), info.id.clone()]);
        table.add_row(vec!["Servers".to_string(), info.guilds.to_string()]);
        table.add_row(vec!["Users".to_string(), info.users.to_string()]);
    }
    if let Some(error) = &status.last_error {
        table.add_row(vec!["Last error", error.as_str()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use botrunner_core::{BotIdentity, BotPhase};

    #[test]
    fn render_includes_identity_when_connected() {
        let status = BotStatus {
            running: true,
            info: Some(BotIdentity::new("Helper#0420", "42", 3, 120)),
            has_token: true,
            phase: BotPhase::Connected,
            last_error: None,
        };
        let out = render(&status).to_string();
        assert!(out.contains("Helper#0420"));
        assert!(out.contains("connected"));
        assert!(out.contains("120"));
    }

    #[test]
    fn render_shows_last_error_when_idle() {
        let status = BotStatus {
            running: false,
            info: None,
            has_token: true,
            phase: BotPhase::Idle,
            last_error: Some("Bot disconnected unexpectedly: closed".to_string()),
        };
        let out = render(&status).to_string();
        assert!(out.contains("disconnected unexpectedly"));
        assert!(!out.contains("Servers"));
    }
}
