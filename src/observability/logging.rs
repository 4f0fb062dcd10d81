//! Tracing subscriber setup.
//!
//! Human or JSON output on stderr, verbosity from `-v` flags, overridden by
//! `SEQLOG_LOG_LEVEL` when set.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable overriding the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "SEQLOG_LOG_LEVEL";

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines, colored when allowed.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}

/// Maps `-v` occurrences to a filter directive: 0 warn, 1 info, 2 debug,
/// anything above trace.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Decides whether stderr output gets ANSI colors.
///
/// `Auto` colors only a terminal, and only when `NO_COLOR` is unset.
#[must_use]
pub fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
        }
    }
}

/// Installs the global subscriber.
///
/// A second call is a no-op, so tests may call it freely.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(show_target)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Human => builder.with_ansi(use_ansi(color)).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
