use clap::{Parser, Subcommand};
use sentience_query::Tier;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sentience", version, about = "Query and diff semantic page snapshots")]
pub struct Cli {
    /// YAML configuration file; skipped when missing.
    #[arg(long, global = true, env = "SENTIENCE_CONFIG", default_value = "sentience.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a selector against a saved snapshot, best match first.
    Query {
        snapshot: PathBuf,
        selector: String,
        /// Evaluate as this tier instead of the snapshot's own.
        #[arg(long)]
        tier: Option<Tier>,
        /// Print only the best match.
        #[arg(long)]
        find: bool,
        #[arg(long)]
        json: bool,
    },
    /// Compare a snapshot against an earlier one.
    Diff {
        current: PathBuf,
        #[arg(long)]
        previous: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Open `url` in a browser with the extension loaded and save its snapshot.
    Capture {
        url: String,
        /// Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
