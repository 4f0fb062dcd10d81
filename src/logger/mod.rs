//! Structured session logger.
//!
//! A [`Logger`] turns each logging call into one [`LogRecord`] and hands it to
//! every registered [`Sink`] whose minimum level admits it. Loggers form
//! lineages: [`Logger::session`] derives a child with a longer message prefix,
//! a new session identifier segment and frozen baseline data, while
//! [`Logger::with_data`] derives a view that only adds baseline data.
//!
//! ```
//! use std::sync::Arc;
//! use seqlog::logger::{Logger, TestSink};
//! use seqlog::record::Data;
//!
//! let sink = Arc::new(TestSink::new());
//! let mut logger = Logger::new("svc");
//! logger.register_sink(sink.clone());
//!
//! let task = logger.session("task", &[Data::from([("task", "t1")])]);
//! task.info("starting", &[]);
//!
//! let logs = sink.logs().unwrap();
//! assert_eq!(logs[0].message, "svc.task.starting");
//! assert_eq!(logs[0].data.get_str("session"), Some("1"));
//! ```

pub mod buffer;
pub mod sink;
pub mod trace;

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use tracing::warn;

use crate::error::ExitCode;
use crate::record::{Data, LogLevel, LogRecord, format_timestamp};

pub use buffer::Buffer;
pub use sink::{Sink, TestSink, WriterSink};
pub use trace::{REQUEST_ID_HEADER, SpanId, TraceId, trace_data};

/// Upper bound on the stack trace captured by [`Logger::fatal`], in bytes.
pub const STACK_TRACE_BUFFER_SIZE: usize = 100 * 1024;

/// A structured logger view.
///
/// Cheap to derive from: the sink list is shared by reference, and only the
/// message prefix, session identifier and baseline data are per view.
///
/// Sinks registered on a logger are visible to everything derived from it
/// afterwards, but never to views derived before the registration, nor to
/// the logger it was itself derived from.
#[derive(Clone)]
pub struct Logger {
    component: Arc<str>,
    task: String,
    sinks: Arc<Vec<Arc<dyn Sink>>>,
    session_id: String,
    // Shared with `with_data` views, fresh for every `session` child.
    next_session: Arc<AtomicU32>,
    data: Data,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("task", &self.task)
            .field("session_id", &self.session_id)
            .field("sinks", &self.sinks.len())
            .field("data", &self.data)
            .finish()
    }
}

impl Logger {
    /// Creates a root logger for `component` with no sinks.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        let component: String = component.into();
        Self {
            task: component.clone(),
            component: component.into(),
            sinks: Arc::new(Vec::new()),
            session_id: String::new(),
            next_session: Arc::new(AtomicU32::new(0)),
            data: Data::new(),
        }
    }

    /// Appends a sink to this logger's sink list.
    ///
    /// Views derived earlier keep the list they were created with.
    pub fn register_sink(&mut self, sink: Arc<dyn Sink>) {
        // Copy-on-write: clones the list only while derived views share it.
        Arc::make_mut(&mut self.sinks).push(sink);
    }

    /// Number of sinks this view dispatches to.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Component name every record of this lineage carries as `source`.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Dotted message prefix (component followed by session names).
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.task
    }

    /// Dotted session identifier; empty for a root logger.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Baseline data merged into every record.
    #[must_use]
    pub const fn data(&self) -> &Data {
        &self.data
    }

    /// Derives a sub-session named `task`.
    ///
    /// The child's session identifier is this logger's identifier extended
    /// by a segment drawn from this logger's counter, so siblings never share
    /// an identifier even when derived concurrently. Segments start at 1 and
    /// saturate at `u32::MAX`: past that many derivations from one logger,
    /// further siblings all get `u32::MAX`.
    #[must_use]
    pub fn session(&self, task: &str, data: &[Data]) -> Self {
        let segment = self
            .next_session
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map_or(u32::MAX, |prev| prev + 1);
        let session_id = if self.session_id.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{segment}", self.session_id)
        };

        Self {
            component: Arc::clone(&self.component),
            task: format!("{}.{task}", self.task),
            sinks: Arc::clone(&self.sinks),
            data: self.base_data(data),
            session_id,
            next_session: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Derives a view whose baseline data also contains `data`.
    #[must_use]
    pub fn with_data(&self, data: &Data) -> Self {
        let mut view = self.clone();
        view.data = self.base_data(std::slice::from_ref(data));
        view
    }

    /// Derives a view carrying the trace of a request.
    ///
    /// `request_id` is the value of the [`REQUEST_ID_HEADER`] header. When it
    /// is absent or not a valid trace id the view carries no trace data.
    #[must_use]
    pub fn with_trace_info(&self, request_id: Option<&str>) -> Self {
        trace_data(request_id).map_or_else(|| self.with_data(&Data::new()), |d| self.with_data(&d))
    }

    /// Logs `action` at debug level.
    pub fn debug(&self, action: &str, data: &[Data]) {
        self.dispatch(&self.record(action, LogLevel::Debug, self.base_data(data), None));
    }

    /// Logs `action` at info level.
    pub fn info(&self, action: &str, data: &[Data]) {
        self.dispatch(&self.record(action, LogLevel::Info, self.base_data(data), None));
    }

    /// Logs `action` at error level.
    ///
    /// A present `err` is recorded as the record's `error` and mirrored into
    /// `data["error"]`.
    pub fn error(&self, action: &str, err: Option<&dyn std::error::Error>, data: &[Data]) {
        let mut data = self.base_data(data);
        let error = err.map(ToString::to_string);
        if let Some(message) = &error {
            data.insert("error", message.clone());
        }
        self.stamp_session(&mut data);
        self.dispatch(&self.record(action, LogLevel::Error, data, error));
    }

    /// Logs `action` at fatal level and returns the abort signal.
    ///
    /// The current stack trace is captured into `data["trace"]` before the
    /// record is dispatched. The caller must not continue normally; what to
    /// do with the returned [`FatalAbort`] (exit, propagate) is up to the host.
    pub fn fatal(
        &self,
        action: &str,
        err: Option<&dyn std::error::Error>,
        data: &[Data],
    ) -> FatalAbort {
        let mut data = self.base_data(data);
        let error = err.map(ToString::to_string);
        if let Some(message) = &error {
            data.insert("error", message.clone());
        }
        data.insert("trace", capture_stack_trace());
        self.stamp_session(&mut data);

        let record = self.record(action, LogLevel::Fatal, data, error);
        self.dispatch(&record);

        FatalAbort {
            message: record.message,
            error: record.error,
        }
    }

    /// Baseline, then each given map in order, then the session stamp.
    fn base_data(&self, given: &[Data]) -> Data {
        let mut data = self.data.clone();
        for extra in given {
            data.merge(extra);
        }
        self.stamp_session(&mut data);
        data
    }

    fn stamp_session(&self, data: &mut Data) {
        if !self.session_id.is_empty() {
            data.insert("session", self.session_id.clone());
        }
    }

    fn record(&self, action: &str, level: LogLevel, data: Data, error: Option<String>) -> LogRecord {
        LogRecord {
            timestamp: format_timestamp(Utc::now()),
            source: self.component.to_string(),
            message: format!("{}.{action}", self.task),
            level: level.into(),
            data,
            error,
        }
    }

    fn dispatch(&self, record: &LogRecord) {
        for sink in self.sinks.iter() {
            if record.level.known().is_none_or(|l| l < sink.min_level()) {
                continue;
            }
            if let Err(e) = sink.write(record) {
                warn!(error = %e, message = %record.message, "sink rejected record");
            }
        }
    }
}

fn capture_stack_trace() -> String {
    let mut trace = Backtrace::force_capture().to_string();
    if trace.len() > STACK_TRACE_BUFFER_SIZE {
        let mut end = STACK_TRACE_BUFFER_SIZE;
        while !trace.is_char_boundary(end) {
            end -= 1;
        }
        trace.truncate(end);
    }
    trace
}

// ============================================================================
// Fatal abort
// ============================================================================

/// Returned by [`Logger::fatal`] after the record has reached every sink.
///
/// Stands in for unwinding: the host decides whether to [`exit`](Self::exit)
/// or to propagate it as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a fatal record means the caller must stop; exit or propagate the abort"]
pub struct FatalAbort {
    /// Message of the fatal record.
    pub message: String,
    /// Display form of the error that caused it, if any.
    pub error: Option<String>,
}

impl FatalAbort {
    /// Terminates the process with [`ExitCode::FATAL`].
    pub fn exit(self) -> ! {
        eprintln!("{self}");
        std::process::exit(ExitCode::FATAL)
    }
}

impl fmt::Display for FatalAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "fatal: {}: {error}", self.message),
            None => write!(f, "fatal: {}", self.message),
        }
    }
}

impl std::error::Error for FatalAbort {}

// ============================================================================
// Tests
// ============================================================================
