use crate::sentience_browser::capture::{snapshot_from_value, SnapshotOptions, SnapshotSource};
use anyhow::Context;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use sentience_common::{Result, SentienceError};
use sentience_query::Snapshot;
use serde_json::json;
use std::{collections::HashMap, path::PathBuf, time::Duration};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};
use url::Url;
use webdriver::capabilities::Capabilities;

const EXTENSION_READY_PROBE: &str = "return typeof window.sentience !== 'undefined' \
     && typeof window.sentience.snapshot === 'function';";
const SNAPSHOT_SCRIPT: &str = "return window.sentience.snapshot(arguments[0]);";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connection settings for a Chromium session driven over WebDriver.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// Unpacked extension directory; loaded as the only enabled extension.
    pub extension_dir: Option<PathBuf>,
    /// How long [`SentienceDriver::goto`] waits for `window.sentience`.
    pub extension_timeout: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            extension_dir: None,
            extension_timeout: Duration::from_millis(5000),
        }
    }
}

fn chrome_arguments(settings: &DriverSettings) -> Vec<String> {
    let mut args = vec![
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if let Some(dir) = &settings.extension_dir {
        let dir = dir.display();
        args.push(format!("--disable-extensions-except={dir}"));
        args.push(format!("--load-extension={dir}"));
    }
    if settings.headless {
        args.push("--headless=new".into());
        args.push("--disable-gpu".into());
    }
    args
}

/// A WebDriver session with the snapshot extension loaded.
pub struct SentienceDriver {
    pub client: Client,
    settings: DriverSettings,
}

impl SentienceDriver {
    /// Open a new browser session against `settings.webdriver_url`.
    pub async fn connect(settings: DriverSettings) -> Result<Self> {
        Url::parse(&settings.webdriver_url).map_err(|e| {
            SentienceError::Config(format!("webdriver_url `{}`: {e}", settings.webdriver_url))
        })?;

        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(chrome_arguments(&settings)));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("connecting to WebDriver at {}", settings.webdriver_url))?;

        info!(
            target: "browser.session",
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            extension = settings.extension_dir.is_some(),
            "browser session opened"
        );
        Ok(Self { client, settings })
    }

    /// Navigate to `url` and block until the extension has injected itself.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        self.wait_for_extension().await
    }

    /// Poll for `window.sentience` until it appears or the timeout elapses.
    pub async fn wait_for_extension(&self) -> Result<()> {
        let timeout = self.settings.extension_timeout;
        let started = Instant::now();
        loop {
            let ready = self
                .client
                .execute(EXTENSION_READY_PROBE, vec![])
                .await
                .context("probing for window.sentience")?;
            if ready.as_bool() == Some(true) {
                debug!(
                    target: "browser.session",
                    waited_ms = started.elapsed().as_millis() as u64,
                    "extension ready"
                );
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(SentienceError::Timeout(timeout.as_millis() as u64));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn current_url(&self) -> Result<Url> {
        Ok(self.client.current_url().await.context("reading current URL")?)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await.context("closing browser session")?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for SentienceDriver {
    async fn snapshot(&self, options: &SnapshotOptions) -> Result<Snapshot> {
        let payload = serde_json::to_value(options)
            .map_err(|e| SentienceError::Snapshot(format!("encoding snapshot options: {e}")))?;
        let raw = self
            .client
            .execute(SNAPSHOT_SCRIPT, vec![payload])
            .await
            .context("calling window.sentience.snapshot")?;

        let snapshot = snapshot_from_value(raw, options)?;
        info!(
            target: "browser.snapshot",
            url = snapshot.url.as_deref().unwrap_or(""),
            elements = snapshot.elements.len(),
            tier = ?snapshot.tier,
            "snapshot captured"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_flags_only_when_configured() {
        let args = chrome_arguments(&DriverSettings::default());
        assert!(!args.iter().any(|a| a.starts_with("--load-extension")));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));

        let args = chrome_arguments(&DriverSettings {
            headless: true,
            extension_dir: Some(PathBuf::from("/opt/sentience/extension")),
            ..DriverSettings::default()
        });
        assert!(args.contains(&"--load-extension=/opt/sentience/extension".to_string()));
        assert!(args.contains(&"--disable-extensions-except=/opt/sentience/extension".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
    }

    #[tokio::test]
    async fn malformed_endpoint_is_a_config_error() {
        let settings = DriverSettings {
            webdriver_url: "localhost 9515".into(),
            ..DriverSettings::default()
        };
        assert!(matches!(
            SentienceDriver::connect(settings).await,
            Err(SentienceError::Config(_))
        ));
    }
}
