//! `seqlog` - structured session logger and ordered log-sequence matcher
//!
//! [`logger`] writes one JSON record per call to pluggable sinks, with
//! hierarchical sessions and trace propagation. [`matcher`] reads such
//! records back and asserts that an expected sequence occurs in order,
//! producing a readable report when it does not.

pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod matcher;
pub mod observability;
pub mod record;
