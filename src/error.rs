//! Error types for `seqlog`
//!
//! One error enum per domain (matching, sinks, expectation files).
//! [`SeqLogError`] aggregates the ones that can end a CLI run and maps each
//! onto an exit code; sink failures never do, the logger reports them through
//! `tracing` and carries on.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `seqlog` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// The expected sequence was found (or, negated, was absent)
    pub const SUCCESS: i32 = 0;

    /// The log did not satisfy the expectation
    pub const MISMATCH: i32 = 1;

    /// Expectation file error (invalid YAML, unknown level, empty sequence)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// The log stream contained a malformed record
    pub const DECODE_ERROR: i32 = 4;

    /// A fatal record was logged and the host chose to abort
    pub const FATAL: i32 = 5;

    /// Usage error (invalid arguments, unsupported matcher input)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `seqlog` operations.
#[derive(Debug, Error)]
pub enum SeqLogError {
    /// The matcher could not evaluate its input
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Expectation file loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A fatal record was logged and the caller chose to stop
    #[error(transparent)]
    Fatal(#[from] crate::logger::FatalAbort),

    /// The log did not satisfy the expectation; carries the rendered report
    #[error("{0}")]
    Mismatch(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SeqLogError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Match(err) => err.exit_code(),
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::DECODE_ERROR,
            Self::Mismatch(_) => ExitCode::MISMATCH,
            Self::Fatal(_) => ExitCode::FATAL,
        }
    }
}

// ============================================================================
// Matcher Errors
// ============================================================================

/// Errors that make a sequence match inconclusive.
///
/// None of these mean "the sequence was not found"; that outcome is a plain
/// `Ok(false)` from the matcher.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The matcher was handed a value it cannot read records from
    #[error(
        "contain_sequence must be given a byte stream, a contents provider, a buffer provider \
         or an in-memory byte buffer; got {type_name}"
    )]
    UnsupportedSource {
        /// Rust type name of the rejected value
        type_name: &'static str,
    },

    /// A record in the stream was not well-formed
    #[error("malformed log record: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading the source failed
    #[error("failed to read log source: {0}")]
    Io(#[from] std::io::Error),

    /// A flat key/value list had a key that is not a string
    #[error("invalid type for data key: want string, got {key}")]
    InvalidDataKey {
        /// The offending key, rendered as JSON
        key: String,
    },
}

impl MatchError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedSource { .. } | Self::InvalidDataKey { .. } => ExitCode::USAGE_ERROR,
            Self::Decode(_) => ExitCode::DECODE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Sink Errors
// ============================================================================

/// Failure of a sink to accept a record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the destination failed
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized
    #[error("sink serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Expectation file loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the expectation file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Referenced file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// The file declares no expectations
    #[error("{path} declares no expectations")]
    EmptySequence {
        /// Path to the expectation file
        path: PathBuf,
    },

    /// The file exceeds the configured size limit
    #[error("{path} is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Path to the expectation file
        path: PathBuf,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Environment variable referenced in the file is not set
    #[error("environment variable '{var}' not set ({message})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied with `${VAR:?message}`
        message: String,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `seqlog` operations.
pub type Result<T> = std::result::Result<T, SeqLogError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::MISMATCH, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::DECODE_ERROR, 4);
        assert_eq!(ExitCode::FATAL, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_unsupported_source_is_usage_error() {
        let err: SeqLogError = MatchError::UnsupportedSource { type_name: "u32" }.into();
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
        assert!(err.to_string().contains("got u32"));
    }

    #[test]
    fn test_decode_error_exit_code() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SeqLogError = MatchError::Decode(json_err).into();
        assert_eq!(err.exit_code(), ExitCode::DECODE_ERROR);
    }

    #[test]
    fn test_mismatch_exit_code() {
        let err = SeqLogError::Mismatch("report".to_string());
        assert_eq!(err.exit_code(), ExitCode::MISMATCH);
        assert_eq!(err.to_string(), "report");
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: SeqLogError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: SeqLogError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("expect.yaml"),
            line: Some(42),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("expect.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_fatal_abort_exit_code() {
        let abort = crate::logger::FatalAbort {
            message: "svc.crash".to_string(),
            error: Some("disk full".to_string()),
        };
        let err: SeqLogError = abort.into();
        assert_eq!(err.exit_code(), ExitCode::FATAL);
        assert_eq!(err.to_string(), "fatal: svc.crash: disk full");
    }

    #[test]
    fn test_config_parse_failure_is_config_error() {
        let err: SeqLogError = ConfigError::ParseError {
            path: PathBuf::from("expect.yaml"),
            line: Some(1),
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_invalid_data_key_display() {
        let err = MatchError::InvalidDataKey {
            key: "42".to_string(),
        };
        assert_eq!(err.to_string(), "invalid type for data key: want string, got 42");
    }
}
