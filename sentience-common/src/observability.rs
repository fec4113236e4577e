//! Process-wide `tracing` setup.
//!
//! The CLI and the integration tests install one subscriber that writes to a
//! daily rolling file, optionally mirrored to stderr, as text or JSON lines.
//! `RUST_LOG` overrides the configured filter.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the non-blocking writer alive for the life of the process.
struct Installed {
    _guard: WorkerGuard,
    file: PathBuf,
}

static INSTALLED: OnceLock<Installed> = OnceLock::new();

/// Environment variable consulted when no explicit log directory is given.
pub const LOG_DIR_ENV: &str = "SENTIENCE_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}` (expected text or json)")),
        }
    }
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for defaults and file names).
    pub app_name: &'static str,
    /// Falls back to `SENTIENCE_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Mirror events to stderr.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Default filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "sentience",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Install the process-wide subscriber and return today's log file.
///
/// Only the first call configures anything; later calls return the file
/// chosen then, whatever `config` they pass.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(done) = INSTALLED.get() {
        return Ok(done.file.clone());
    }

    let dir = log_dir_for(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let stem = format!("{}.log", config.app_name);
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &stem));
    let file = dir.join(dated_file_name(&stem, &Utc::now().date_naive()));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let to_file = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
    };
    let to_stderr = match (config.emit_stderr, config.format) {
        (false, _) => None,
        (true, LogFormat::Json) => Some(fmt::layer().json().with_writer(std::io::stderr).boxed()),
        (true, LogFormat::Text) => Some(fmt::layer().with_writer(std::io::stderr).boxed()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(to_file)
        .with(to_stderr)
        .try_init()
        .context("installing global tracing subscriber")?;

    let installed = INSTALLED.get_or_init(|| Installed {
        _guard: guard,
        file,
    });
    Ok(installed.file.clone())
}

/// Name `tracing_appender::rolling::daily` gives the file for `date` (UTC).
fn dated_file_name(stem: &str, date: &NaiveDate) -> String {
    format!("{stem}.{}", date.format("%Y-%m-%d"))
}

/// Explicit directory, then `SENTIENCE_LOG_DIR`, then the per-user data dir.
fn log_dir_for(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));

    match (chosen, home) {
        (Some(dir), Some(home)) => match dir.strip_prefix("~") {
            Ok(rest) => home.join(rest),
            Err(_) => dir,
        },
        (Some(dir), None) => dir,
        (None, Some(home)) => home.join(".local/share").join(app_name),
        (None, None) => PathBuf::from(app_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(log_dir_for("sentience-test", Some(tmp.path())), tmp.path());
        assert_eq!(
            log_dir_for("sentience-test", Some(Path::new("/var/log/sentience"))),
            PathBuf::from("/var/log/sentience")
        );
    }

    #[test]
    fn file_name_matches_daily_roller() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(dated_file_name("sentience.log", &date), "sentience.log.2026-03-07");
    }

    #[test]
    fn parses_log_format_names() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
