//! Typed error definitions for kutil.
//!
//! Provides [`KutilError`] for the failures the logging bootstrap and the
//! file helpers can surface. All variants implement `std::error::Error` via
//! `thiserror`, so they integrate seamlessly with `anyhow::Result` in host
//! applications.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KutilError>;

/// Domain-specific errors for kutil.
#[derive(Debug, Error)]
pub enum KutilError {
    /// A file that must exist was not found.
    #[error("file {} doesn't exist", .0.display())]
    FileNotFound(PathBuf),

    /// Generic filesystem error on a known path.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Logback file exists but its content is not a name → level mapping.
    #[error("malformed logback {}: {source}", path.display())]
    MalformedLogback {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A logger is configured with a level outside the known set.
    #[error("unknown log level '{level}' configured for logger '{logger}'")]
    UnknownLevel { logger: String, level: String },

    /// The log destination could not be created.
    #[error("cannot open log destination {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error outside of logback loading.
    #[error("json error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another global `tracing` subscriber is already installed.
    #[error("cannot install global subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

impl KutilError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
