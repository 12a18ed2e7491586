//! The append-only, line-oriented event log all actors write to
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::actor::{ActorLabel, Event};
use crate::error::{Error, Result};
use crate::time::Timestamp;

const SEPARATOR: &str = " | ";

type Writer = Box<dyn Write + Send>;

/// A single formatted entry of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: Timestamp,
    pub label: ActorLabel,
    pub event: Event,
}

impl LogLine {
    pub fn new(timestamp: Timestamp, label: ActorLabel, event: Event) -> Self {
        Self {
            timestamp,
            label,
            event,
        }
    }

    /// Parse a line as written by [`LogSink::append`]
    ///
    /// Bare task ids are read as requests for clients and as executions
    /// for the server.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(3, SEPARATOR);

        let (Some(timestamp), Some(label), Some(payload)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::ParseLine(line.to_string()));
        };

        let timestamp: Timestamp = timestamp.parse()?;
        let label: ActorLabel = label.parse()?;
        let event = Event::parse(label, payload)?;

        Ok(Self::new(timestamp, label, event))
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            fmt,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.timestamp, self.label, self.event
        )
    }
}

/// Serializes writes from all actors so lines never interleave
///
/// Every line is formatted up front and then written and flushed while
/// holding the lock, so operators can `tail` the file while a run is live.
pub struct LogSink {
    writer: Mutex<Option<Writer>>,
}

impl LogSink {
    /// Open (or create) a log file for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::OpenLog {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!("Opened log file {}", path.display());
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Some(Box::new(writer))),
        }
    }

    /// A sink backed by memory, plus a handle to read back what was written
    pub fn in_memory() -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    pub fn append(&self, timestamp: Timestamp, label: ActorLabel, event: Event) -> Result<()> {
        let mut line = LogLine::new(timestamp, label, event).to_string();
        line.push('\n');

        let mut writer = self.writer.lock();
        let writer = writer.as_mut().ok_or(Error::LogClosed)?;

        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Flush and release the underlying writer
    ///
    /// Closing an already closed sink does nothing.
    pub fn close(&self) -> Result<()> {
        let writer = self.writer.lock().take();

        if let Some(mut writer) = writer {
            writer.flush()?;
            log::debug!("Closed log sink");
        }

        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }
}

/// In-memory log contents, shared between a sink and its readers
#[derive(Clone, Default)]
pub struct LogBuffer {
    data: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.data.lock()).into_owned()
    }

    pub fn lines(&self) -> Result<Vec<LogLine>> {
        self.contents().lines().map(LogLine::parse).collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
