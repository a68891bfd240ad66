//! Logging bootstrap built on the `tracing` ecosystem.
//!
//! A [`LoggingContext`] owns everything the bootstrap mutates: the root
//! destinations, the logger registry, the logback cache and the run-once
//! flag. Host applications normally use the process-wide instance through
//! [`get_logger`]; tests build isolated contexts and install them with
//! `tracing::subscriber::with_default`.
//!
//! # Usage
//!
//! ```ignore
//! let log = kutil_core::get_logger("com.app.worker", "conf/logback.json", "/var/log/app")?;
//! tracing::info!(target: "com.app.worker", "worker started");
//! ```
//!
//! The first call opens `<log_dir>/<program>.log` (daily rotation, 5 rotated
//! files kept) and loads the logback file. Later calls reuse both.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{Subscriber, debug};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;
use crate::file;
use crate::file_type::LOG;
use crate::format::LineFormat;
use crate::level::{EffectiveLevel, resolve_level};
use crate::logback::{LogbackCache, LogbackSource};
use crate::logger::{Logger, LoggerRegistry};
use crate::root::RootLogger;
use crate::rotation::{DEFAULT_BACKUP_COUNT, TimedRotatingFile};
use crate::singleton::{Singleton, SingletonCell};

/// All state of one logging setup.
pub struct LoggingContext {
    program: String,
    root: RootLogger,
    registry: Arc<LoggerRegistry>,
    logback: LogbackCache,
    initialized: Mutex<bool>,
}

impl LoggingContext {
    /// Context named after the running executable.
    pub fn new() -> Self {
        Self::with_program_name(file::program_name())
    }

    pub fn with_program_name(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            root: RootLogger::new(),
            registry: Arc::new(LoggerRegistry::new()),
            logback: LogbackCache::new(),
            initialized: Mutex::new(false),
        }
    }

    /// Replace where logback files are read from.
    pub fn with_logback_source(mut self, source: impl LogbackSource + 'static) -> Self {
        self.logback = LogbackCache::with_source(source);
        self
    }

    pub fn program_name(&self) -> &str {
        &self.program
    }

    pub fn root(&self) -> &RootLogger {
        &self.root
    }

    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Active log file for `log_dir`: `<log_dir>/<program>.log`.
    pub fn log_file_path(&self, log_dir: &Path) -> PathBuf {
        log_dir.join(LOG.add_extension(&self.program))
    }

    /// Attach the rotating file destination, once.
    ///
    /// Destinations attached earlier are detached and closed first. Fails if
    /// `log_dir` is missing or unwritable; the flag stays unset in that case so
    /// a later call can retry.
    pub fn initialize(&self, log_dir: &Path) -> Result<()> {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        if *initialized {
            return Ok(());
        }

        let path = self.log_file_path(log_dir);
        let destination = TimedRotatingFile::open(&path, DEFAULT_BACKUP_COUNT)?;
        let released = self.root.replace_all(Box::new(destination));
        *initialized = true;

        debug!("logging to {} ({released} previous destination(s) released)", path.display());
        Ok(())
    }

    /// Logger for `name`, configured from the logback file at `logback_path`.
    ///
    /// Runs [`initialize`](Self::initialize) first. A missing logback file
    /// means every logger gets the default level. `OFF` disables the logger and
    /// leaves its threshold alone; any other level becomes its threshold.
    pub fn get_logger(&self, name: &str, logback_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> Result<Logger> {
        self.initialize(log_dir.as_ref())?;

        let logback = self.logback.load(logback_path.as_ref())?;
        let level = resolve_level(name, &logback)?;

        let logger = self.registry.get_or_create(name);
        match level {
            EffectiveLevel::Off => logger.disable(),
            EffectiveLevel::Threshold(level) => logger.set_level(level),
        }
        Ok(logger)
    }

    /// Subscriber writing through this context's root in the fixed line format.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        let registry = Arc::clone(&self.registry);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(self.root.clone())
            .event_format(LineFormat::new(self.program.clone()))
            .with_filter(filter_fn(move |meta| registry.enabled(meta.target(), *meta.level())));

        tracing_subscriber::registry().with(layer)
    }

    /// Install [`subscriber`](Self::subscriber) as the global default.
    pub fn install_global(&self) -> Result<()> {
        self.subscriber().try_init()?;
        Ok(())
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Singleton for LoggingContext {
    fn create() -> Self {
        Self::new()
    }

    fn post_init(&self) {
        if let Err(e) = self.install_global() {
            // no subscriber of ours to report through
            eprintln!("kutil: {e}");
        }
    }
}

static GLOBAL: SingletonCell<LoggingContext> = SingletonCell::new();

/// The process-wide context. Built, and installed as the global `tracing`
/// subscriber, on first access.
pub fn global() -> &'static LoggingContext {
    GLOBAL.get()
}

/// [`LoggingContext::get_logger`] on the process-wide context.
pub fn get_logger(name: &str, logback_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> Result<Logger> {
    global().get_logger(name, logback_path, log_dir)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::Ordering;

    use chrono::TimeZone;
    use tracing::Level;

    use super::*;
    use crate::error::KutilError;
    use crate::level::LogLevel;
    use crate::logback::tests::CountingSource;
    use crate::root::tests::MemoryDestination;
    use crate::rotation::TimedRotatingFile;

    const LOGBACK: &str = r#"{"A": "DEBUG", "C": "OFF", "W": "WARN", "X": "VERBOSE"}"#;

    fn setup() -> (tempfile::TempDir, PathBuf, LoggingContext) {
        let dir = tempfile::tempdir().unwrap();
        let logback = dir.path().join("logback.json");
        fs::write(&logback, LOGBACK).unwrap();
        (dir, logback, LoggingContext::with_program_name("my_service"))
    }

    #[test]
    fn configured_default_and_off_loggers() {
        let (dir, logback, ctx) = setup();

        let a = ctx.get_logger("A", &logback, dir.path()).unwrap();
        assert_eq!(a.level(), Some(LogLevel::Debug));
        assert!(!a.is_disabled());

        let b = ctx.get_logger("B", &logback, dir.path()).unwrap();
        assert_eq!(b.level(), Some(LogLevel::Info));
        assert!(!b.is_disabled());

        let c = ctx.get_logger("C", &logback, dir.path()).unwrap();
        assert!(c.is_disabled());
        assert_eq!(c.level(), None);

        let w = ctx.get_logger("W", &logback, dir.path()).unwrap();
        assert!(w.is_enabled_for(Level::WARN));
        assert!(!w.is_enabled_for(Level::INFO));
    }

    #[test]
    fn off_keeps_previous_threshold() {
        let (dir, logback, ctx) = setup();
        ctx.registry().get_or_create("C").set_level(LogLevel::Error);

        let c = ctx.get_logger("C", &logback, dir.path()).unwrap();
        assert!(c.is_disabled());
        assert_eq!(c.level(), Some(LogLevel::Error));
    }

    #[test]
    fn missing_logback_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("my_service");
        let missing = dir.path().join("absent.json");

        for name in ["A", "B", "C"] {
            let logger = ctx.get_logger(name, &missing, dir.path()).unwrap();
            assert_eq!(logger.level(), Some(LogLevel::Info));
            assert!(!logger.is_disabled());
        }
    }

    #[test]
    fn unknown_level_surfaces_at_logger_creation() {
        let (dir, logback, ctx) = setup();

        let err = ctx.get_logger("X", &logback, dir.path()).unwrap_err();
        assert!(matches!(err, KutilError::UnknownLevel { .. }));
        assert!(ctx.registry().get("X").is_none());
    }

    #[test]
    fn malformed_logback_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let logback = dir.path().join("logback.json");
        fs::write(&logback, "not json").unwrap();
        let ctx = LoggingContext::with_program_name("my_service");

        let err = ctx.get_logger("A", &logback, dir.path()).unwrap_err();
        assert!(matches!(err, KutilError::MalformedLogback { .. }));
    }

    #[test]
    fn logback_read_once_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (source, reads) = CountingSource::new(Some(r#"{"A": "ERROR"}"#));
        let ctx = LoggingContext::with_program_name("my_service").with_logback_source(source);

        ctx.get_logger("A", "logback.json", dir.path()).unwrap();
        ctx.get_logger("B", "logback.json", dir.path()).unwrap();
        ctx.get_logger("A", "logback.json", dir.path()).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("my_service");

        assert!(!ctx.is_initialized());
        ctx.initialize(first.path()).unwrap();
        ctx.initialize(second.path()).unwrap();

        assert!(ctx.is_initialized());
        assert_eq!(ctx.root().len(), 1);
        assert!(first.path().join("my_service.log").exists());
        assert!(!second.path().join("my_service.log").exists());
    }

    #[test]
    fn initialize_releases_previous_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("my_service");
        let (old, old_records, old_closed) = MemoryDestination::new();
        ctx.root().attach(Box::new(old));

        ctx.initialize(dir.path()).unwrap();

        assert!(old_closed.load(Ordering::SeqCst));
        assert_eq!(ctx.root().len(), 1);

        ctx.root().emit(b"routed to file\n");
        assert!(old_records.lock().unwrap().is_empty());
        let written = fs::read_to_string(dir.path().join("my_service.log")).unwrap();
        assert_eq!(written, "routed to file\n");
    }

    #[test]
    fn missing_log_dir_fails_and_can_retry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("my_service");

        let err = ctx.initialize(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, KutilError::Destination { .. }));
        assert!(!ctx.is_initialized());
        assert!(ctx.root().is_empty());

        ctx.initialize(dir.path()).unwrap();
        assert!(ctx.is_initialized());
    }

    #[test]
    fn events_are_filtered_and_formatted() {
        let (dir, logback, ctx) = setup();
        ctx.get_logger("A", &logback, dir.path()).unwrap();
        ctx.get_logger("C", &logback, dir.path()).unwrap();
        ctx.get_logger("B", &logback, dir.path()).unwrap();

        tracing::subscriber::with_default(ctx.subscriber(), || {
            tracing::debug!(target: "A", "debug from A");
            tracing::error!(target: "C", "silenced");
            tracing::debug!(target: "B", "below default");
            tracing::info!(target: "B", count = 3, "info from B");
        });

        let written = fs::read_to_string(dir.path().join("my_service.log")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2, "unexpected output:\n{written}");

        assert!(lines[0].contains(" - (A:"));
        assert!(lines[0].ends_with(") [my_service] [DEBUG] : debug from A"));
        assert!(lines[1].contains(" - (B:"));
        assert!(lines[1].contains("[my_service] [INFO] : info from B"));
        assert!(lines[1].contains("count=3"));
    }

    #[test]
    fn concurrent_first_calls_initialize_once() {
        let dir = tempfile::tempdir().unwrap();
        let (source, reads) = CountingSource::new(Some(r#"{"A": "WARN"}"#));
        let ctx = Arc::new(LoggingContext::with_program_name("my_service").with_logback_source(source));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                let log_dir = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    let name = if i % 2 == 0 { "A" } else { "B" };
                    ctx.get_logger(name, "logback.json", &log_dir).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ctx.root().len(), 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.registry().get("A").unwrap().level(), Some(LogLevel::Warn));
    }

    #[test]
    fn rollover_logging_does_not_deadlock() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("svc");
        // rotation's own debug output is raised while the root is writing
        ctx.registry().get_or_create("kutil_core::rotation").set_level(LogLevel::Debug);

        let path = dir.path().join("svc.log");
        fs::write(&path, "stale line\n").unwrap();
        let mut file = TimedRotatingFile::open(&path, 5).unwrap();
        let past = chrono::Local.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        file.set_rollover_at(past);
        ctx.root().attach(Box::new(file));

        tracing::subscriber::with_default(ctx.subscriber(), || {
            tracing::info!(target: "app", "hello after rollover");
        });

        let rotated = dir.path().join("svc.log.2020-01-01.log");
        assert_eq!(fs::read_to_string(&rotated).unwrap(), "stale line\n");

        let active = fs::read_to_string(&path).unwrap();
        assert_eq!(active.lines().count(), 1);
        assert!(active.contains("[svc] [INFO] : hello after rollover"));
    }

    #[test]
    fn missing_logback_logs_a_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::with_program_name("my_service");
        ctx.registry().get_or_create("kutil_core::logback").set_level(LogLevel::Debug);
        let (dest, records, _) = MemoryDestination::new();
        ctx.root().attach(Box::new(dest));

        let cache = LogbackCache::new();
        tracing::subscriber::with_default(ctx.subscriber(), || {
            cache.load(&dir.path().join("absent.json")).unwrap();
        });

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("not found, using defaults"));
    }

    #[test]
    fn global_context_is_shared() {
        assert!(std::ptr::eq(global(), global()));
        assert!(!global().program_name().is_empty());
    }
}
