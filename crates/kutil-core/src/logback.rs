//! Logback configuration loading.
//!
//! A logback file is a flat JSON object mapping logger names to level names:
//!
//! ```json
//! {
//!   "com.app.worker": "DEBUG",
//!   "com.app.api": "WARN",
//!   "com.app.chatty": "OFF"
//! }
//! ```
//!
//! Level names are not validated here; an unknown name only fails when the
//! logger it belongs to is resolved (see [`crate::level::resolve_level`]).
//!
//! [`LogbackCache`] loads each path at most once per cache lifetime. A missing
//! file is cached as an empty mapping; malformed content is reported and not
//! cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{KutilError, Result};
use crate::file;

/// Logger name → level name, as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Logback {
    levels: HashMap<String, String>,
}

impl Logback {
    /// Parse logback JSON text. `path` is only used for error reporting.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| KutilError::MalformedLogback { path: path.to_path_buf(), source })
    }

    /// Configured level name for `logger_name`, by exact match.
    pub fn get(&self, logger_name: &str) -> Option<&str> {
        self.levels.get(logger_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<(String, String)> for Logback {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { levels: iter.into_iter().collect() }
    }
}

/// Where logback text comes from.
///
/// `Ok(None)` means "no such file" and is treated as an empty configuration.
pub trait LogbackSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<Option<String>>;
}

/// Reads logback files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl LogbackSource for FsSource {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        file::read_file(path).map(Some)
    }
}

/// Path-keyed cache of loaded logback configurations.
pub struct LogbackCache {
    source: Box<dyn LogbackSource>,
    entries: Mutex<AHashMap<PathBuf, Arc<Logback>>>,
}

impl LogbackCache {
    pub fn new() -> Self {
        Self::with_source(FsSource)
    }

    pub fn with_source(source: impl LogbackSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: Mutex::new(AHashMap::new()),
        }
    }

    /// Return the configuration for `path`, reading it on first use only.
    ///
    /// The lock is held across the read so concurrent first calls for the
    /// same path still read once.
    pub fn load(&self, path: &Path) -> Result<Arc<Logback>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entries.get(path) {
            return Ok(Arc::clone(cached));
        }

        let logback = match self.source.read(path)? {
            Some(text) => {
                let logback = Logback::parse(path, &text)?;
                debug!("logback {} loaded with {} entries", path.display(), logback.len());
                logback
            }
            None => {
                debug!("logback {} not found, using defaults", path.display());
                Logback::default()
            }
        };

        let logback = Arc::new(logback);
        entries.insert(path.to_path_buf(), Arc::clone(&logback));
        Ok(logback)
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogbackCache {
    fn default() -> Self {
        Self::new()
    }
}
