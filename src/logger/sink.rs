//! Record sinks.
//!
//! A [`Sink`] is an append-only destination for records. The logger, not the
//! sink, compares each record's level against [`Sink::min_level`] before
//! handing it over.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::SinkError;
use crate::record::{LogLevel, LogRecord};

use super::buffer::Buffer;

/// Destination for serialized records.
pub trait Sink: Send + Sync {
    /// Lowest level this sink accepts.
    fn min_level(&self) -> LogLevel;

    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// Writer sink
// ---------------------------------------------------------------------------

/// Writes each record as one JSON line to an [`io::Write`](std::io::Write).
///
/// The writer is flushed after every line so that readers of the underlying
/// file or buffer always see whole records.
pub struct WriterSink {
    // Held only for the duration of one line.
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    min_level: LogLevel,
}

impl fmt::Debug for WriterSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl WriterSink {
    /// Creates a sink writing to `writer`, accepting `min_level` and above.
    #[must_use]
    pub fn new(writer: impl Write + Send + 'static, min_level: LogLevel) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(Box::new(writer))),
            min_level,
        }
    }

    /// Creates a sink writing to stdout.
    #[must_use]
    pub fn stdout(min_level: LogLevel) -> Self {
        Self::new(std::io::stdout(), min_level)
    }

    /// Creates a sink writing to stderr.
    #[must_use]
    pub fn stderr(min_level: LogLevel) -> Self {
        Self::new(std::io::stderr(), min_level)
    }

    /// Creates a sink appending to the file at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn from_file(path: &Path, min_level: LogLevel) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(file, min_level))
    }
}

impl Sink for WriterSink {
    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        drop(writer);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test sink
// ---------------------------------------------------------------------------

/// In-memory sink for tests: accepts every level and keeps the serialized
/// records in a [`Buffer`].
#[derive(Debug)]
pub struct TestSink {
    buffer: Buffer,
    inner: WriterSink,
}

impl Default for TestSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSink {
    /// Creates an empty test sink.
    #[must_use]
    pub fn new() -> Self {
        let buffer = Buffer::new();
        Self {
            inner: WriterSink::new(buffer.clone(), LogLevel::Debug),
            buffer,
        }
    }

    /// The buffer holding every record written so far.
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Decodes every record written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer holds something other than records,
    /// which can only happen if it was written to directly.
    pub fn logs(&self) -> Result<Vec<LogRecord>, serde_json::Error> {
        serde_json::Deserializer::from_slice(&self.buffer.contents())
            .into_iter::<LogRecord>()
            .collect()
    }

    /// Messages of every record written so far, in order.
    ///
    /// # Errors
    ///
    /// See [`logs`](Self::logs).
    pub fn log_messages(&self) -> Result<Vec<String>, serde_json::Error> {
        Ok(self.logs()?.into_iter().map(|r| r.message).collect())
    }
}

impl Sink for TestSink {
    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.inner.write(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Data;

    fn sample(level: LogLevel) -> LogRecord {
        LogRecord {
            timestamp: "1.000000000".to_owned(),
            source: "svc".to_owned(),
            message: "svc.start".to_owned(),
            level: level.into(),
            data: Data::from([("task", "t")]),
            error: None,
        }
    }

    #[test]
    fn writer_sink_writes_one_json_line_per_record() {
        let buffer = Buffer::new();
        let sink = WriterSink::new(buffer.clone(), LogLevel::Debug);
        sink.write(&sample(LogLevel::Info)).unwrap();
        sink.write(&sample(LogLevel::Error)).unwrap();

        let contents = String::from_utf8(buffer.contents().to_vec()).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["log_level"], 1);
        assert_eq!(lines[1]["log_level"], 2);
        assert_eq!(lines[0]["data"]["task"], "t");
    }

    #[test]
    fn writer_sink_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let sink = WriterSink::from_file(&path, LogLevel::Info).unwrap();
        assert_eq!(sink.min_level(), LogLevel::Info);
        sink.write(&sample(LogLevel::Info)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let record: LogRecord = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record.message, "svc.start");
    }

    #[test]
    fn test_sink_decodes_its_records() {
        let sink = TestSink::new();
        sink.write(&sample(LogLevel::Debug)).unwrap();
        sink.write(&sample(LogLevel::Fatal)).unwrap();

        let logs = sink.logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].level, LogLevel::Fatal);
        assert_eq!(sink.log_messages().unwrap(), vec!["svc.start", "svc.start"]);
    }
}
