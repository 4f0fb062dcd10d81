//! Ordered log-sequence matching.
//!
//! Build [`Expectation`]s with the helpers in [`entry`], then check a record
//! source with [`contain_sequence`]:
//!
//! ```
//! use seqlog::logger::{Logger, TestSink};
//! use seqlog::matcher::contain_sequence;
//! use seqlog::matcher::entry::{data, info};
//! use seqlog::record::Data;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(TestSink::new());
//! let mut logger = Logger::new("svc");
//! logger.register_sink(sink.clone());
//! logger.info("start", &[Data::from([("task", "t1")])]);
//!
//! let mut matcher = contain_sequence([info([data("task", "t1")])]);
//! assert!(matcher.matches(&mut sink.clone()).unwrap());
//! ```

pub mod actual;
pub mod entry;
pub mod report;
pub mod sequence;

pub use actual::{Actual, BufferProvider, ContentsProvider, Stream, with_actual};
pub use entry::{ANY_ERR, EntryOption, Expectation};
pub use report::Report;
pub use sequence::{ContainSequence, SequenceOutcome, contain_sequence, decode_records, find_sequence};
