//! `seqlog` - check structured JSON logs for an ordered record sequence

use clap::Parser;

use seqlog::cli::args::Cli;
use seqlog::cli::commands;
use seqlog::error::ExitCode;
use seqlog::observability::{LogFormat, init_logging};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() {
                ExitCode::USAGE_ERROR
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    if !cli.quiet {
        init_logging(LogFormat::Human, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
