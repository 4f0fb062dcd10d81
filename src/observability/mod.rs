//! Diagnostics of `seqlog` itself.
//!
//! Records produced through [`crate::logger`] are the data under test; this
//! module only configures the `tracing` output of the tool and library.

pub mod logging;

pub use logging::{LogFormat, init_logging, use_ansi, verbosity_to_directive};
