//! Fixed log line layout.
//!
//! ```text
//! 2026-10-18 09:15:02,117 - (com.app.worker:42) [my_service] [INFO] : started
//! ```

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Timestamp layout: local time with millisecond precision after a comma.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Render one log line (without trailing newline).
pub fn format_line(
    timestamp: &DateTime<Local>,
    logger: &str,
    line: u32,
    program: &str,
    level: Level,
    message: &str,
) -> String {
    format!(
        "{} - ({}:{}) [{}] [{}] : {}",
        timestamp.format(TIMESTAMP_FORMAT),
        logger,
        line,
        program,
        level,
        message
    )
}

/// `FormatEvent` that writes [`format_line`] for every event.
#[derive(Debug, Clone)]
pub struct LineFormat {
    program: String,
}

impl LineFormat {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let meta = event.metadata();
        let line = format_line(
            &Local::now(),
            meta.target(),
            meta.line().unwrap_or(0),
            &self.program,
            *meta.level(),
            &message,
        );
        writer.write_str(&line)?;
        writeln!(writer)
    }
}
