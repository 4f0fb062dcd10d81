//! Log record data model.
//!
//! A [`LogRecord`] is what the logger writes and what the sequence matcher
//! reads back. Records serialize to one self-describing JSON object each:
//!
//! ```json
//! {"timestamp":"1700000000.000000123","source":"svc","message":"svc.action",
//!  "log_level":1,"data":{"session":"1","task":"t"}}
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Level
// ============================================================================

/// Severity of a record.
///
/// Serialized as its ordinal (`0` = debug .. `3` = fatal). The ordering is
/// used by sinks for filtering; the matcher only ever compares for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LogLevel {
    /// Verbose diagnostics.
    #[default]
    Debug,
    /// Normal operation.
    Info,
    /// A failure the caller recovers from.
    Error,
    /// A failure after which the caller must not continue.
    Fatal,
}

impl LogLevel {
    /// All levels in ascending severity.
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Error, Self::Fatal];

    /// Lowercase name used in expectation files and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        level as Self
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("unknown log level {value}, expected 0..=3"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "0" => Ok(Self::Debug),
            "info" | "1" => Ok(Self::Info),
            "error" | "2" => Ok(Self::Error),
            "fatal" | "3" => Ok(Self::Fatal),
            other => Err(format!(
                "unknown log level '{other}', expected one of debug, info, error, fatal"
            )),
        }
    }
}

/// Level as carried by a decoded record.
///
/// Writers only ever produce the four known levels, but a reader accepts any
/// integer: a record with an ordinal outside 0..=3 decodes fine and simply
/// never equals a [`LogLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordLevel {
    /// One of the four levels.
    Known(LogLevel),
    /// Any other integer.
    Other(i64),
}

impl RecordLevel {
    /// Returns the level if it is one of the four known ones.
    #[must_use]
    pub const fn known(self) -> Option<LogLevel> {
        match self {
            Self::Known(level) => Some(level),
            Self::Other(_) => None,
        }
    }
}

impl Default for RecordLevel {
    fn default() -> Self {
        Self::Known(LogLevel::default())
    }
}

impl From<LogLevel> for RecordLevel {
    fn from(level: LogLevel) -> Self {
        Self::Known(level)
    }
}

impl PartialEq<LogLevel> for RecordLevel {
    fn eq(&self, other: &LogLevel) -> bool {
        *self == Self::Known(*other)
    }
}

impl fmt::Display for RecordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(level) => fmt::Display::fmt(level, f),
            Self::Other(n) => write!(f, "level({n})"),
        }
    }
}

// ============================================================================
// Data
// ============================================================================

/// Structured key/value payload of a record.
///
/// Keys are unique and their order carries no meaning. Values are arbitrary
/// JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data(Map<String, Value>);

impl Data {
    /// Creates an empty data map.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value stored under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copies every entry of `other` into `self`; `other` wins on collision.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Consumes the map, returning the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Data {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Data {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

// ============================================================================
// Record
// ============================================================================

/// One structured log event.
///
/// Deserialization is lenient in the same way a record stream reader has to
/// be: unknown fields are ignored, absent fields take their zero value and a
/// `null` data map reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    /// Seconds since the epoch with a fixed nine-digit fraction.
    pub timestamp: String,
    /// Component the logger lineage was created for.
    pub source: String,
    /// Session path plus action, dot separated.
    pub message: String,
    /// Severity.
    #[serde(rename = "log_level")]
    pub level: RecordLevel,
    /// Structured payload.
    #[serde(deserialize_with = "null_as_default")]
    pub data: Data,
    /// Display form of the error passed to an error or fatal call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Formats a time as seconds since the epoch with a nine-digit fraction.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    // Leap seconds report a fraction above one second.
    let nanos = time.timestamp_subsec_nanos().min(999_999_999);
    format!("{}.{nanos:09}", time.timestamp())
}

// ============================================================================
// Canonical JSON
// ============================================================================

/// Renders a value in the single form used for comparing data values.
///
/// Object keys come out sorted and floats holding an integral value are
/// rendered as integers, so `1`, `1u64` and `1.0` all compare equal, as do
/// two objects that differ only in key order.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

// 2^53: the largest range where every integer is exactly representable as f64.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
