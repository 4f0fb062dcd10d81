//! Expectation file loader.
//!
//! Loading runs in stages:
//! 1. Size check against [`LoaderOptions::max_file_size`]
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing into [`ExpectationFile`]
//! 4. Level validation and conversion to [`Expectation`]s

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use tracing::debug;

use crate::config::schema::ExpectationFile;
use crate::error::ConfigError;
use crate::matcher::Expectation;

// ============================================================================
// Public API
// ============================================================================

/// Options for the expectation loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Largest file accepted, in bytes.
    pub max_file_size: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_file_size: env_or("SEQLOG_MAX_FILE_SIZE", 10 * 1024 * 1024),
        }
    }
}

/// Result of loading an expectation file.
#[derive(Debug)]
pub struct LoadResult {
    /// Expected sequence, in file order.
    pub expectations: Vec<Expectation>,

    /// Non-fatal problems found while loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning raised while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// File the warning refers to.
    pub location: Option<String>,
}

/// Loads expectation files.
#[derive(Debug, Default)]
pub struct ExpectationLoader {
    options: LoaderOptions,
}

impl ExpectationLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with options read from the environment.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Reads and parses the expectation file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing or unreadable
    /// - The file exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing fails
    /// - A level is unknown
    /// - The file declares no expectations
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        if metadata.len() > self.options.max_file_size {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.options.max_file_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Parses expectation text; `path` is only used in diagnostics.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file system checks.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let (expanded, warnings) = expand_env(raw, path)?;

        let root: serde_yaml::Value =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;
        if root.is_null() {
            return Err(ConfigError::EmptySequence {
                path: path.to_path_buf(),
            });
        }

        let file: ExpectationFile =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!("invalid expectation file: {e}"),
            })?;

        let expectations = file.to_expectations()?;
        if expectations.is_empty() {
            return Err(ConfigError::EmptySequence {
                path: path.to_path_buf(),
            });
        }

        debug!(
            path = %path.display(),
            count = expectations.len(),
            limit = self.options.max_file_size,
            "loaded expectation file"
        );

        Ok(LoadResult {
            expectations,
            warnings,
        })
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expands environment references in raw text before parsing.
///
/// Supports:
/// - `${VAR}`: value, or empty with a warning if unset
/// - `${VAR:-default}`: `default` if unset
/// - `${VAR:?message}`: error if unset
/// - `$$`: literal `$`
fn expand_env(raw: &str, path: &Path) -> Result<(String, Vec<LoadWarning>), ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut warnings = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let reference = parse_reference(&mut chars, path)?;
                match (std::env::var(&reference.name), reference.fallback) {
                    (Ok(value), _) => out.push_str(&value),
                    (Err(_), Fallback::Default(value)) => out.push_str(&value),
                    (Err(_), Fallback::Required(message)) => {
                        return Err(ConfigError::EnvVarNotSet {
                            var: reference.name,
                            message,
                        });
                    }
                    (Err(_), Fallback::Empty) => warnings.push(LoadWarning {
                        message: format!(
                            "environment variable '{}' is not set, using empty string",
                            reference.name
                        ),
                        location: Some(path.display().to_string()),
                    }),
                }
            }
            _ => out.push(c),
        }
    }

    Ok((out, warnings))
}

struct Reference {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

/// Parses the remainder of a `${...}` reference, consuming the closing brace.
fn parse_reference(chars: &mut Peekable<Chars<'_>>, path: &Path) -> Result<Reference, ConfigError> {
    let mut name = String::new();

    while let Some(c) = chars.next() {
        match c {
            '}' => {
                return Ok(Reference {
                    name,
                    fallback: Fallback::Empty,
                });
            }
            ':' if chars.peek() == Some(&'-') => {
                chars.next();
                let value = read_until_close(chars, path)?;
                return Ok(Reference {
                    name,
                    fallback: Fallback::Default(value),
                });
            }
            ':' if chars.peek() == Some(&'?') => {
                chars.next();
                let message = read_until_close(chars, path)?;
                return Ok(Reference {
                    name,
                    fallback: Fallback::Required(message),
                });
            }
            _ => name.push(c),
        }
    }

    Err(unclosed(path, &name))
}

/// Reads up to the matching `}`, keeping nested braces.
fn read_until_close(chars: &mut Peekable<Chars<'_>>, path: &Path) -> Result<String, ConfigError> {
    let mut value = String::new();
    let mut depth = 1usize;

    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }

    Err(unclosed(path, &value))
}

fn unclosed(path: &Path, partial: &str) -> ConfigError {
    ConfigError::ParseError {
        path: path.to_path_buf(),
        line: None,
        message: format!("unclosed environment variable reference: ${{{partial}"),
    }
}

/// Parses an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
