//! Common types and utilities shared across Sentience crates.
//!
//! This crate holds the shared error type and the observability helpers
//! used throughout the Sentience workspace. It stays dependency-light so
//! that the query engine, the drivers and the CLI can all depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`SentienceError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use sentience_common::SentienceError;
//!
//! let err = SentienceError::Snapshot("extension returned status=error".into());
//! assert_eq!(err.to_string(), "Snapshot error: extension returned status=error");
//! ```

pub mod observability;

/// Error types used across the Sentience system.
#[derive(thiserror::Error, Debug)]
pub enum SentienceError {
    /// A driver (WebDriver session, page script, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// The in-page extension produced an unusable snapshot.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred after {0} ms")]
    Timeout(u64),
}

/// Convenient alias for results that use [`SentienceError`].
pub type Result<T> = std::result::Result<T, SentienceError>;
