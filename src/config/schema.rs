//! Expectation file schema.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matcher::Expectation;
use crate::matcher::entry::{data, entry, message, source};
use crate::record::{Data, LogLevel};

/// Root of an expectation file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationFile {
    /// Expected records, in order.
    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,
}

/// One expected record as written in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationConfig {
    /// Level name (`debug`, `info`, `error`, `fatal`) or ordinal (0..=3).
    pub level: LevelSpec,

    /// Required source; omitted means any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    /// Required message; omitted means any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Required data entries.
    #[serde(default, skip_serializing_if = "Data::is_empty")]
    pub data: Data,

    /// Required `data.error` value, applied after `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A level as written in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    /// Numeric form, as it appears in records
    Ordinal(u64),

    /// Name form
    Name(String),
}

impl LevelSpec {
    /// Resolves to a level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming `field` if the name or
    /// ordinal is unknown.
    pub fn resolve(&self, field: &str) -> Result<LogLevel, ConfigError> {
        let parsed = match self {
            Self::Ordinal(n) => u8::try_from(*n)
                .map_err(|_| String::new())
                .and_then(LogLevel::try_from),
            Self::Name(name) => name.parse(),
        };
        parsed.map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: self.to_string(),
            expected: "one of debug, info, error, fatal (or 0..=3)".to_string(),
        })
    }
}

impl std::fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl ExpectationConfig {
    /// Converts to a matcher expectation. `index` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown level.
    pub fn to_expectation(&self, index: usize) -> Result<Expectation, ConfigError> {
        let level = self.level.resolve(&format!("expectations[{index}].level"))?;

        let mut options = Vec::with_capacity(4);
        if !self.source.is_empty() {
            options.push(source(self.source.clone()));
        }
        if !self.message.is_empty() {
            options.push(message(self.message.clone()));
        }
        options.extend(self.data.iter().map(|(k, v)| data(k.clone(), v.clone())));
        if let Some(err) = &self.error {
            options.push(data("error", err.clone()));
        }
        Ok(entry(level, options))
    }
}

impl ExpectationFile {
    /// Converts every entry, in order.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn to_expectations(&self) -> Result<Vec<Expectation>, ConfigError> {
        self.expectations
            .iter()
            .enumerate()
            .map(|(i, e)| e.to_expectation(i))
            .collect()
    }
}
