//! `seqlog check`: match a log stream against an expectation file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::config::ExpectationLoader;
use crate::error::SeqLogError;
use crate::matcher::{ContainSequence, Report, Stream, contain_sequence};

/// Runs the check.
///
/// # Errors
///
/// Returns [`SeqLogError::Mismatch`] if the assertion does not hold, and the
/// underlying error if the expectation file or the log cannot be read.
pub fn run(args: &CheckArgs, quiet: bool) -> Result<(), SeqLogError> {
    let loaded = ExpectationLoader::with_defaults().load(&args.expect)?;
    for warning in &loaded.warnings {
        warn!(location = ?warning.location, "{}", warning.message);
    }

    let mut matcher = contain_sequence(loaded.expectations);
    let found = match args.log.as_deref() {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)?;
            matcher.matches(&mut Stream::new(BufReader::new(file)))?
        }
        _ => matcher.matches(&mut Stream::new(io::stdin().lock()))?,
    };
    let passed = found != args.negate;

    info!(
        records = matcher.actual().len(),
        expectations = matcher.expected().len(),
        found,
        negate = args.negate,
        "checked log"
    );

    match args.format {
        OutputFormat::Json => {
            let report = Report::new(
                matcher.actual(),
                matcher.expected(),
                matcher.outcome(),
                args.negate,
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human if passed && !quiet => println!("{}", summary(&matcher, args.negate)),
        OutputFormat::Human => {}
    }

    if passed {
        return Ok(());
    }
    let message = match (args.format, args.negate) {
        (OutputFormat::Human, false) => matcher.failure_message(),
        (OutputFormat::Human, true) => matcher.negated_failure_message(),
        (OutputFormat::Json, false) => "log sequence not found".to_string(),
        (OutputFormat::Json, true) => "log sequence found".to_string(),
    };
    Err(SeqLogError::Mismatch(message))
}

fn summary(matcher: &ContainSequence, negate: bool) -> String {
    let verb = if negate { "absent from" } else { "found in" };
    format!(
        "ok: sequence of {} {verb} {} records",
        matcher.expected().len(),
        matcher.actual().len()
    )
}
