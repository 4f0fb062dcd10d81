//! Expectation builder.
//!
//! An [`Expectation`] is a partially specified record. Empty `source` and
//! `message` mean "any"; the level is always required; each data entry is
//! required individually and data keys it does not mention are ignored.
//!
//! Expectations are built either from option lists, mirroring how records are
//! logged:
//!
//! ```
//! use seqlog::matcher::entry::{data, info, message};
//!
//! let expected = info([message("svc.start"), data("task", "t1")]);
//! assert_eq!(expected.message, "svc.start");
//! ```
//!
//! or with the equivalent builder methods:
//!
//! ```
//! use seqlog::matcher::Expectation;
//!
//! let expected = Expectation::info().message("svc.start").data("task", "t1");
//! assert_eq!(expected.data.get_str("task"), Some("t1"));
//! ```

use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::MatchError;
use crate::record::{Data, LogLevel};

/// Stand-in for "any error": passing it to [`error`] or [`fatal`] adds no
/// error constraint.
pub const ANY_ERR: Option<&'static (dyn StdError + Send + Sync)> = None;

/// A partially specified record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Expectation {
    /// Required source, or empty for any.
    pub source: String,
    /// Required message, or empty for any.
    pub message: String,
    /// Required level.
    pub level: LogLevel,
    /// Required data entries.
    pub data: Data,
}

/// One modification applied while building an [`Expectation`].
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOption {
    /// Require an exact message.
    Message(String),
    /// Require an exact source.
    Source(String),
    /// Require each of these data entries.
    Data(Vec<(String, Value)>),
}

impl EntryOption {
    /// Applies the option; later options overwrite earlier ones.
    pub fn apply(self, entry: &mut Expectation) {
        match self {
            Self::Message(msg) => entry.message = msg,
            Self::Source(src) => entry.source = src,
            Self::Data(pairs) => {
                for (key, value) in pairs {
                    entry.data.insert(key, value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Option-list form
// ---------------------------------------------------------------------------

/// Builds an expectation of `level` from `options`, applied in order.
pub fn entry(level: LogLevel, options: impl IntoIterator<Item = EntryOption>) -> Expectation {
    let mut expectation = Expectation {
        level,
        ..Expectation::default()
    };
    for option in options {
        option.apply(&mut expectation);
    }
    expectation
}

/// Expects a debug record.
pub fn debug(options: impl IntoIterator<Item = EntryOption>) -> Expectation {
    entry(LogLevel::Debug, options)
}

/// Expects an info record.
pub fn info(options: impl IntoIterator<Item = EntryOption>) -> Expectation {
    entry(LogLevel::Info, options)
}

/// Expects an error record.
///
/// A present `err` also requires `data["error"]` to equal its display form;
/// that requirement is applied after `options`.
pub fn error<E>(err: Option<&E>, options: impl IntoIterator<Item = EntryOption>) -> Expectation
where
    E: StdError + ?Sized,
{
    entry(LogLevel::Error, with_error(err, options))
}

/// Expects a fatal record. `err` is handled as in [`error`].
pub fn fatal<E>(err: Option<&E>, options: impl IntoIterator<Item = EntryOption>) -> Expectation
where
    E: StdError + ?Sized,
{
    entry(LogLevel::Fatal, with_error(err, options))
}

fn with_error<E>(
    err: Option<&E>,
    options: impl IntoIterator<Item = EntryOption>,
) -> impl Iterator<Item = EntryOption>
where
    E: StdError + ?Sized,
{
    let implied = err.map(|e| data("error", e.to_string()));
    options.into_iter().chain(implied)
}

/// Requires an exact message.
pub fn message(msg: impl Into<String>) -> EntryOption {
    EntryOption::Message(msg.into())
}

/// Alias of [`message`]: the action is the message a record was logged with.
pub fn action(action: impl Into<String>) -> EntryOption {
    message(action)
}

/// Requires an exact source.
pub fn source(name: impl Into<String>) -> EntryOption {
    EntryOption::Source(name.into())
}

/// Requires one data entry.
pub fn data(key: impl Into<String>, value: impl Into<Value>) -> EntryOption {
    EntryOption::Data(vec![(key.into(), value.into())])
}

/// Requires the data entries of a flat `key, value, key, value, ...` list.
///
/// An odd-length list is padded with an empty string value for its last key.
///
/// # Errors
///
/// Returns [`MatchError::InvalidDataKey`] if a key position holds anything
/// other than a JSON string.
pub fn data_kv(kv: impl IntoIterator<Item = Value>) -> Result<EntryOption, MatchError> {
    let mut kv: Vec<Value> = kv.into_iter().collect();
    // `data_kv(["event"])` means `event == ""`.
    if kv.len() % 2 == 1 {
        kv.push(Value::String(String::new()));
    }

    let mut pairs = Vec::with_capacity(kv.len() / 2);
    let mut items = kv.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        match key {
            Value::String(key) => pairs.push((key, value)),
            other => {
                return Err(MatchError::InvalidDataKey {
                    key: other.to_string(),
                });
            }
        }
    }
    Ok(EntryOption::Data(pairs))
}

// ---------------------------------------------------------------------------
// Builder-method form
// ---------------------------------------------------------------------------

impl Expectation {
    /// Expects a record of `level` with no further constraints.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        entry(level, [])
    }

    /// Expects a debug record.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(LogLevel::Debug)
    }

    /// Expects an info record.
    #[must_use]
    pub fn info() -> Self {
        Self::new(LogLevel::Info)
    }

    /// Expects an error record.
    #[must_use]
    pub fn error() -> Self {
        Self::new(LogLevel::Error)
    }

    /// Expects a fatal record.
    #[must_use]
    pub fn fatal() -> Self {
        Self::new(LogLevel::Fatal)
    }

    /// Applies an option.
    #[must_use]
    pub fn with(mut self, option: EntryOption) -> Self {
        option.apply(&mut self);
        self
    }

    /// Requires an exact message.
    #[must_use]
    pub fn message(self, msg: impl Into<String>) -> Self {
        self.with(message(msg))
    }

    /// Requires an exact source.
    #[must_use]
    pub fn source(self, name: impl Into<String>) -> Self {
        self.with(source(name))
    }

    /// Requires one data entry.
    #[must_use]
    pub fn data(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(data(key, value))
    }

    /// Requires `data["error"]` to equal the display form of `err`.
    #[must_use]
    pub fn caused_by(self, err: &(impl StdError + ?Sized)) -> Self {
        self.data("error", err.to_string())
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if !self.source.is_empty() {
            write!(f, " source={}", self.source)?;
        }
        if !self.message.is_empty() {
            write!(f, " message={}", self.message)?;
        }
        if !self.data.is_empty() {
            write!(f, " data={}", super::report::render_data(&self.data))?;
        }
        Ok(())
    }
}
