//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. YAML files and inline YAML snippets, in the order they were attached
//! 2. `SENTIENCE__`-prefixed environment variables, `__` separating nested
//!    keys (`SENTIENCE__BROWSER__HEADLESS=true`)
//!
//! String values may reference environment variables as `${VAR}`; references
//! are expanded recursively after merging. Scalars are coerced to the field's
//! type, so `license_key: 12345` is the string `"12345"` and
//! `SENTIENCE__BROWSER__HEADLESS=true` is a boolean. Every section has
//! defaults, so an empty configuration is valid.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use sentience_common::observability::{LogConfig, LogFormat};
use sentience_query::Tier;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SENTIENCE";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SentienceConfig {
    pub version: Option<String>,
    /// Unlocks elevated-tier snapshots when present.
    pub license_key: Option<String>,
    pub browser: BrowserSettings,
    pub snapshot: SnapshotSettings,
    pub query: QuerySettings,
    pub logging: LoggingSettings,
}

impl SentienceConfig {
    /// Tier used for snapshots that do not carry one: the explicit
    /// `query.default_tier`, else elevated when a license key is configured.
    pub fn effective_tier(&self) -> Tier {
        match (self.query.default_tier, &self.license_key) {
            (Some(tier), _) => tier,
            (None, Some(key)) if !key.trim().is_empty() => Tier::Elevated,
            _ => Tier::Free,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// Unpacked extension loaded into the browser session.
    pub extension_dir: Option<PathBuf>,
    pub extension_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            extension_dir: None,
            extension_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub limit: Option<u32>,
    pub screenshot: bool,
    pub cache_max_age_ms: u64,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            limit: None,
            screenshot: false,
            cache_max_age_ms: 2000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_tier: Option<Tier>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            log_dir: None,
            emit_stderr: false,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.log_dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.level.clone(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct SentienceConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SentienceConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SentienceConfigLoader {
    /// Start empty; `SENTIENCE__` environment overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use sentience_config::SentienceConfigLoader;
    ///
    /// let config = SentienceConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    /// assert_eq!(config.snapshot.cache_max_age_ms, 2000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing, so deployments can
    /// rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use sentience_config::SentienceConfigLoader;
    /// use sentience_query::Tier;
    ///
    /// let cfg = SentienceConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// browser:
    ///   headless: true
    /// query:
    ///   default_tier: elevated
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(cfg.browser.headless);
    /// assert_eq!(cfg.effective_tier(), Tier::Elevated);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use sentience_config::SentienceConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_LICENSE", "sk-from-env"); }
    ///
    /// let config = SentienceConfigLoader::new()
    ///     .with_yaml_str("license_key: \"${DOC_LICENSE}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.license_key.as_deref(), Some("sk-from-env"));
    ///
    /// unsafe { std::env::remove_var("DOC_LICENSE"); }
    /// ```
    pub fn load(self) -> Result<SentienceConfig, ConfigError> {
        // env values stay strings; the final deserialize coerces scalars
        let merged = self
            .builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut v: Value = merged.try_deserialize()?;
        expand_env_in_value(&mut v);

        Config::try_from(&v)?.try_deserialize()
    }
}
