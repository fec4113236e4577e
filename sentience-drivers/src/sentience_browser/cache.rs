use crate::sentience_browser::capture::{SnapshotOptions, SnapshotSource};
use sentience_common::Result;
use sentience_query::Snapshot;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(2000);

struct Entry {
    snapshot: Arc<Snapshot>,
    taken_at: Instant,
}

/// Reuses the last snapshot from `source` until it is older than `max_age`.
///
/// Pages change underneath a cached snapshot; callers that just acted on the
/// page should pass `force_refresh` or call [`invalidate`](Self::invalidate).
pub struct CachedSnapshot<S> {
    source: S,
    options: SnapshotOptions,
    max_age: Duration,
    entry: Mutex<Option<Entry>>,
}

impl<S: SnapshotSource> CachedSnapshot<S> {
    pub fn new(source: S, options: SnapshotOptions) -> Self {
        Self::with_max_age(source, options, DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(source: S, options: SnapshotOptions, max_age: Duration) -> Self {
        Self {
            source,
            options,
            max_age,
            entry: Mutex::new(None),
        }
    }

    pub async fn get(&self, force_refresh: bool) -> Result<Arc<Snapshot>> {
        let mut entry = self.entry.lock().await;
        if !force_refresh {
            if let Some(e) = entry.as_ref().filter(|e| e.taken_at.elapsed() < self.max_age) {
                debug!(
                    target: "browser.snapshot",
                    age_ms = e.taken_at.elapsed().as_millis() as u64,
                    "snapshot cache hit"
                );
                return Ok(Arc::clone(&e.snapshot));
            }
        }

        let snapshot = Arc::new(self.source.snapshot(&self.options).await?);
        *entry = Some(Entry {
            snapshot: Arc::clone(&snapshot),
            taken_at: Instant::now(),
        });
        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }

    /// True while a snapshot is held and still younger than `max_age`.
    pub async fn is_cached(&self) -> bool {
        self.entry
            .lock()
            .await
            .as_ref()
            .is_some_and(|e| e.taken_at.elapsed() < self.max_age)
    }

    pub async fn age(&self) -> Option<Duration> {
        self.entry.lock().await.as_ref().map(|e| e.taken_at.elapsed())
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn options(&self) -> &SnapshotOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drop the cache and hand back the source, e.g. to close a driver.
    pub fn into_source(self) -> S {
        self.source
    }
}
