//! Logger handles and the name → handle registry.
//!
//! A logger name is a `tracing` target. The registry is consulted by the
//! subscriber's filter for every event, so changing a handle takes effect on
//! the next event of that target.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use tracing::Level;

use crate::level::LogLevel;

/// Threshold slot value meaning "never set".
const UNSET: u8 = 0;

#[derive(Debug)]
struct LoggerState {
    name: String,
    disabled: AtomicBool,
    level: AtomicU8,
}

/// Named logger handle. Clones share state.
#[derive(Debug, Clone)]
pub struct Logger {
    state: Arc<LoggerState>,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self {
            state: Arc::new(LoggerState {
                name: name.to_string(),
                disabled: AtomicBool::new(false),
                level: AtomicU8::new(UNSET),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled.load(Ordering::Relaxed)
    }

    pub fn disable(&self) {
        self.state.disabled.store(true, Ordering::Relaxed);
    }

    pub fn enable(&self) {
        self.state.disabled.store(false, Ordering::Relaxed);
    }

    /// Explicitly set threshold, if any.
    pub fn level(&self) -> Option<LogLevel> {
        LogLevel::from_severity(self.state.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.state.level.store(level.severity(), Ordering::Relaxed);
    }

    /// Threshold in force: the explicit one or [`LogLevel::DEFAULT`].
    pub fn effective_level(&self) -> LogLevel {
        self.level().unwrap_or(LogLevel::DEFAULT)
    }

    /// Whether an event at `level` from this logger would be written.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        !self.is_disabled() && self.effective_level().admits(level)
    }

    /// Whether two handles refer to the same logger.
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// All loggers handed out by one logging context.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: Mutex<AHashMap<String, Logger>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `name`, created on first request.
    pub fn get_or_create(&self, name: &str) -> Logger {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        loggers.entry(name.to_string()).or_insert_with(|| Logger::new(name)).clone()
    }

    pub fn get(&self, name: &str) -> Option<Logger> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    /// Filter decision for an event or span.
    ///
    /// Targets without a handle are held to the default threshold.
    pub fn enabled(&self, target: &str, level: Level) -> bool {
        match self.get(target) {
            Some(logger) => logger.is_enabled_for(level),
            None => LogLevel::DEFAULT.admits(level),
        }
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
