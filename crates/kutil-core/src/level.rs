//! Log levels and per-logger level resolution.
//!
//! Levels carry the classic numeric severities (DEBUG=10 … FATAL=50) so that
//! thresholds compare with a plain `>=`. `OFF` is not a severity: it is
//! modelled as [`EffectiveLevel::Off`] and never reaches a threshold setter.

use std::fmt;
use std::str::FromStr;

use tracing::Level;

use crate::error::{KutilError, Result};
use crate::logback::Logback;

/// Name of the sentinel that disables a logger.
pub const OFF: &str = "OFF";

/// Severity of a record or threshold of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 10,
    Info = 20,
    Warn = 30,
    Error = 40,
    Fatal = 50,
}

/// Value of a `tracing::Level::TRACE` event on the same scale.
const TRACE_SEVERITY: u8 = 5;

impl LogLevel {
    /// Threshold applied to loggers that have no configured level.
    pub const DEFAULT: LogLevel = LogLevel::Info;

    pub fn severity(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_severity(value: u8) -> Option<Self> {
        match value {
            10 => Some(Self::Debug),
            20 => Some(Self::Info),
            30 => Some(Self::Warn),
            40 => Some(Self::Error),
            50 => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Whether a `tracing` event at `level` passes this threshold.
    pub fn admits(self, level: Level) -> bool {
        tracing_severity(level) >= self.severity()
    }
}

/// Severity of a `tracing` level on the numeric scale.
pub fn tracing_severity(level: Level) -> u8 {
    match level {
        Level::TRACE => TRACE_SEVERITY,
        Level::DEBUG => LogLevel::Debug.severity(),
        Level::INFO => LogLevel::Info.severity(),
        Level::WARN => LogLevel::Warn.severity(),
        Level::ERROR => LogLevel::Error.severity(),
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a logger should be set to after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveLevel {
    Threshold(LogLevel),
    Off,
}

impl fmt::Display for EffectiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Threshold(level) => level.fmt(f),
            Self::Off => f.write_str(OFF),
        }
    }
}

impl FromStr for EffectiveLevel {
    type Err = ();

    /// Exact, case-sensitive match against the six known names.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let level = match s {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            "FATAL" => LogLevel::Fatal,
            OFF => return Ok(Self::Off),
            _ => return Err(()),
        };
        Ok(Self::Threshold(level))
    }
}

/// Resolve the level configured for `logger_name`.
///
/// Lookup is by exact name; `a.b.c` does not inherit from `a.b`. Unconfigured
/// loggers get [`LogLevel::DEFAULT`]. A configured but unknown level name is a
/// hard error.
pub fn resolve_level(logger_name: &str, logback: &Logback) -> Result<EffectiveLevel> {
    match logback.get(logger_name) {
        Some(name) => name.parse::<EffectiveLevel>().map_err(|()| KutilError::UnknownLevel {
            logger: logger_name.to_string(),
            level: name.to_string(),
        }),
        None => Ok(EffectiveLevel::Threshold(LogLevel::DEFAULT)),
    }
}
