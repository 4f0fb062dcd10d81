//! CLI command dispatch.

pub mod check;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::SeqLogError;

/// Dispatches a parsed invocation to its handler.
///
/// # Errors
///
/// Returns an error if the handler fails, including
/// [`SeqLogError::Mismatch`] when a check does not hold.
pub fn dispatch(cli: Cli) -> Result<(), SeqLogError> {
    match cli.command {
        Commands::Check(args) => check::run(&args, cli.quiet),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
