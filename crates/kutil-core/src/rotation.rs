//! Timed rotating file destination.
//!
//! The active file keeps its plain name (`my_service.log`). At the first write
//! on or after local midnight it is renamed to `my_service.log.<date>.log`,
//! where `<date>` is the day that just ended, and a fresh file is opened.
//! Only the newest `backup_count` rotated files are kept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Days, Local, NaiveDate};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{KutilError, Result};
use crate::root::Destination;

/// Rotated files kept by the logging bootstrap.
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// Date embedded in rotated file names.
const ROTATED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Suffix (after `<file-name>.`) that identifies a rotated file.
static ROTATED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\.log$").expect("rotated suffix pattern is valid"));

/// File destination that rotates at local midnight.
#[derive(Debug)]
pub struct TimedRotatingFile {
    path: PathBuf,
    file: Option<File>,
    backup_count: usize,
    rollover_at: DateTime<Local>,
}

impl TimedRotatingFile {
    /// Open `path` for appending. The parent directory must already exist.
    ///
    /// `backup_count == 0` keeps every rotated file.
    pub fn open(path: impl Into<PathBuf>, backup_count: usize) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path).map_err(|source| KutilError::Destination { path: path.clone(), source })?;

        // an existing file rolls over at the midnight after its last write
        let last_write = file
            .metadata()
            .and_then(|meta| meta.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        debug!("log destination {} opened", path.display());
        Ok(Self {
            path,
            file: Some(file),
            backup_count,
            rollover_at: next_midnight(last_write),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rollover_at(&self) -> DateTime<Local> {
        self.rollover_at
    }

    #[cfg(test)]
    pub(crate) fn set_rollover_at(&mut self, at: DateTime<Local>) {
        self.rollover_at = at;
    }

    /// Write a record as if the current time were `now`.
    pub fn write_at(&mut self, record: &[u8], now: DateTime<Local>) -> io::Result<()> {
        if now >= self.rollover_at {
            self.rollover(now)?;
        }

        let file = self.file.as_mut().ok_or_else(|| io::Error::other("log destination is closed"))?;
        file.write_all(record)?;
        file.flush()
    }

    /// Path the active file is renamed to when `day` ends.
    pub fn rotated_path(&self, day: NaiveDate) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}.log", day.format(ROTATED_DATE_FORMAT)));
        PathBuf::from(name)
    }

    /// Rotated siblings of the active file, oldest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Some(file_name) = self.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{file_name}.");

        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(suffix) = name.strip_prefix(&prefix) {
                if ROTATED_SUFFIX.is_match(suffix) {
                    found.push(entry.path());
                }
            }
        }

        // fixed-width dates sort chronologically
        found.sort();
        Ok(found)
    }

    fn rollover(&mut self, now: DateTime<Local>) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let ended = self.rollover_at.date_naive();
        let ended = ended.checked_sub_days(Days::new(1)).unwrap_or(ended);
        let rotated = self.rotated_path(ended);

        if rotated.exists() {
            fs::remove_file(&rotated)?;
        }
        if self.path.exists() {
            fs::rename(&self.path, &rotated)?;
        }
        debug!("rotated {} to {}", self.path.display(), rotated.display());

        self.prune();
        self.file = Some(open_append(&self.path)?);
        self.rollover_at = next_midnight(now);
        Ok(())
    }

    fn prune(&self) {
        if self.backup_count == 0 {
            return;
        }

        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                warn!("cannot list rotated logs of {}: {e}", self.path.display());
                return;
            }
        };
        if backups.len() <= self.backup_count {
            return;
        }

        let stale = backups.len() - self.backup_count;
        for path in &backups[..stale] {
            if let Err(e) = fs::remove_file(path) {
                warn!("failed to prune rotated log {}: {e}", path.display());
            }
        }
    }
}

impl Destination for TimedRotatingFile {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.write_at(record, Local::now())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// First local midnight strictly after `t`.
fn next_midnight(t: DateTime<Local>) -> DateTime<Local> {
    t.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        // midnight skipped by a DST jump
        .unwrap_or_else(|| t.checked_add_days(Days::new(1)).unwrap_or(t))
}
