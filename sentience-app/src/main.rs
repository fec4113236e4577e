use anyhow::Result;
use clap::Parser;
use sentience_common::observability::init_logging;
use sentience_config::{SentienceConfig, SentienceConfigLoader};
use std::io::{self, Write};

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: SentienceConfig = SentienceConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    // 2) Logging goes to the rolling file; stdout carries results only
    let log_file = init_logging(cfg.logging.to_log_config("sentience"))?;
    tracing::debug!(config = %cli.config.display(), log_file = %log_file.display(), "starting");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Query {
            snapshot,
            selector,
            tier,
            find,
            json,
        } => commands::run_query(&mut out, &cfg, &snapshot, &selector, tier, find, json)?,
        Command::Diff {
            current,
            previous,
            json,
        } => commands::run_diff(&mut out, &current, previous.as_deref(), json)?,
        Command::Capture { url, out: dest } => {
            commands::run_capture(&mut out, &cfg, &url, dest.as_deref()).await?
        }
    }
    out.flush()?;
    Ok(())
}
