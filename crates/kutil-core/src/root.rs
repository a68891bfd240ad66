//! Root logging facility: the set of attached destinations.
//!
//! [`RootLogger`] is the `MakeWriter` of the context's fmt layer. Each event is
//! buffered by a [`RecordWriter`] and delivered to every destination as one
//! record when the writer is dropped.

use std::cell::Cell;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;

/// Somewhere log records go.
pub trait Destination: Send {
    /// Write one complete, newline-terminated record.
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Release held resources. No record is written afterwards.
    fn close(&mut self) -> io::Result<()>;
}

/// Shared list of attached destinations. Clones refer to the same list.
#[derive(Clone, Default)]
pub struct RootLogger {
    destinations: Arc<Mutex<Vec<Box<dyn Destination>>>>,
}

impl RootLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, destination: Box<dyn Destination>) {
        self.lock().push(destination);
    }

    /// Detach every destination, close each one, then attach `destination`.
    ///
    /// Returns how many destinations were released. Close failures are logged
    /// and do not prevent the new destination from being attached.
    pub fn replace_all(&self, destination: Box<dyn Destination>) -> usize {
        let released = std::mem::take(&mut *self.lock());
        let count = released.len();

        // closed outside the lock: a warning below is routed back through us
        for mut old in released {
            if let Err(e) = old.close() {
                warn!("failed to close released log destination: {e}");
            }
        }

        self.attach(destination);
        count
    }

    /// Deliver one record to every destination.
    ///
    /// A record raised while a destination is writing (e.g. a pruning
    /// warning) goes to stderr instead of re-entering the lock.
    pub fn emit(&self, record: &[u8]) {
        let Some(_guard) = EmitGuard::enter() else {
            eprint!("{}", String::from_utf8_lossy(record));
            return;
        };

        for destination in self.lock().iter_mut() {
            if let Err(e) = destination.write_record(record) {
                // cannot log this through ourselves
                eprintln!("kutil: failed to write log record: {e}");
            }
        }
    }

    pub fn flush(&self) {
        for destination in self.lock().iter_mut() {
            if let Err(e) = destination.flush() {
                eprintln!("kutil: failed to flush log destination: {e}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Box<dyn Destination>>> {
        self.destinations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

struct EmitGuard;

impl EmitGuard {
    fn enter() -> Option<Self> {
        if EMITTING.with(|flag| flag.replace(true)) { None } else { Some(Self) }
    }
}

impl Drop for EmitGuard {
    fn drop(&mut self) {
        EMITTING.with(|flag| flag.set(false));
    }
}

/// Per-event buffer handed out by [`RootLogger::make_writer`].
pub struct RecordWriter {
    root: RootLogger,
    buf: Vec<u8>,
}

impl io::Write for RecordWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RecordWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.root.emit(&self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for RootLogger {
    type Writer = RecordWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter {
            root: self.clone(),
            buf: Vec::new(),
        }
    }
}
