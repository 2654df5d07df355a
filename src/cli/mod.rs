//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommands:
//! - `run` -- run a step group against the live Bot API and print a report
//! - `check-config` -- load and validate settings, print them redacted
//! - `version` -- print build/version info

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::bot::BotClient;
use crate::config::Settings;
use crate::logging;
use crate::scenario::{poll_group, GroupReport, PollProbe};

/// Live probes for a bot-messaging API.
#[derive(Parser, Debug)]
#[command(
    name = "botprobe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run ordered live checks against a bot-messaging API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a step group and print its report. Exits 1 when a step fails.
    Run {
        /// JSON5 settings file (environment variables still apply).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Step group to run.
        #[arg(short, long, value_enum, default_value_t = Group::Polls)]
        group: Group,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load and validate settings, then print them (token redacted) as JSON.
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print version and git commit information.
    Version,
}

/// Step groups the binary can run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    Polls,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

/// Run the `run` subcommand. Returns whether every step passed.
pub async fn handle_run(
    config: Option<&Path>,
    group: Group,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = Settings::load(config)?;
    logging::init(&settings.logging)?;

    let report = run_group(&settings, group).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        println!("{}", report);
    }
    Ok(report.all_passed())
}

/// Authenticate, skip stale updates, then run `group` to completion
pub async fn run_group(settings: &Settings, group: Group) -> crate::Result<GroupReport> {
    let bot = BotClient::new(
        settings.api_token.clone(),
        &settings.api_base,
        settings.request_timeout(),
    )?;
    let me = bot.get_me().await?;
    info!(bot_id = me.id, username = ?me.username, "authenticated");

    match group {
        Group::Polls => {
            let mut probe = PollProbe::new(bot, settings.chat_id, settings.receiver_config())?;
            probe.prepare().await?;
            Ok(poll_group().run(&mut probe).await)
        }
    }
}

/// Run the `check-config` subcommand.
pub fn handle_check_config(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(config)?;
    println!("{}", serde_json::to_string_pretty(&settings.redacted()?)?);
    Ok(())
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("botprobe {}", env!("CARGO_PKG_VERSION"));
    println!("  Git commit: {}", env!("BOTPROBE_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
