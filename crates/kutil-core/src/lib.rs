//! # kutil-core
//!
//! Utility crate for host services, providing:
//!
//! - **Logging** (`logging`) — run-once bootstrap and logger factory over `tracing`
//! - **Logback** (`logback`) — cached JSON logger-name → level configuration
//! - **Levels** (`level`) — severities, the `OFF` sentinel, per-logger resolution
//! - **Loggers** (`logger`) — shared logger handles and the name registry
//! - **Root** (`root`) — attached destinations, `MakeWriter` for the fmt layer
//! - **Rotation** (`rotation`) — file destination rotated at local midnight
//! - **Format** (`format`) — the fixed log line layout
//! - **Files** (`file`, `file_type`) — read/save/cleanup helpers, known extensions
//! - **Singleton** (`singleton`) — one lazily built instance per type
//! - **Error types** (`error`) — domain-specific `KutilError` via thiserror

pub mod error;
pub mod file;
pub mod file_type;
pub mod format;
pub mod level;
pub mod logback;
pub mod logger;
pub mod logging;
pub mod root;
pub mod rotation;
pub mod singleton;

pub use error::{KutilError, Result};
pub use level::{EffectiveLevel, LogLevel};
pub use logger::Logger;
pub use logging::{LoggingContext, get_logger};
