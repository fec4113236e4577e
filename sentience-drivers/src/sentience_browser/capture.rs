use async_trait::async_trait;
use sentience_common::{Result, SentienceError};
use sentience_query::{Snapshot, Tier};
use serde::Serialize;
use serde_json::Value;

/// Element filter applied inside the extension before elements are returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_z_index: Option<f64>,
}

/// Options object handed to `window.sentience.snapshot(options)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SnapshotFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
}

impl SnapshotOptions {
    /// Snapshots taken with a license key are elevated; all others are free.
    pub fn tier(&self) -> Tier {
        match self.license_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Tier::Elevated,
            _ => Tier::Free,
        }
    }
}

/// Anything that can produce a page snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, options: &SnapshotOptions) -> Result<Snapshot>;
}

/// Turn the extension's raw return value into a [`Snapshot`], stamping the
/// tier implied by `options`.
pub fn snapshot_from_value(value: Value, options: &SnapshotOptions) -> Result<Snapshot> {
    if value.is_null() {
        return Err(SentienceError::Snapshot(
            "window.sentience.snapshot() returned nothing".into(),
        ));
    }
    let snapshot: Snapshot = serde_json::from_value(value)
        .map_err(|e| SentienceError::Snapshot(format!("malformed snapshot payload: {e}")))?;

    if snapshot.is_error() {
        return Err(SentienceError::Snapshot(
            snapshot
                .error
                .unwrap_or_else(|| "extension reported status=error".into()),
        ));
    }
    Ok(snapshot.with_tier(options.tier()))
}
