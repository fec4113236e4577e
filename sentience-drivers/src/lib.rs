//! Driver layer: capturing snapshots from a live browser.
//!
//! The query engine never talks to a browser; this crate produces the
//! [`Snapshot`](sentience_query::Snapshot)s it consumes.
//!
//! - [`sentience_browser::capture::SnapshotSource`]: anything that can produce a snapshot
//! - [`sentience_browser::driver::SentienceDriver`]: WebDriver session with the extension loaded
//! - [`sentience_browser::cache::CachedSnapshot`]: reuse of fresh snapshots between actions
pub mod sentience_browser;
