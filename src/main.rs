//! Binary entry point for the `pcsaves` CLI.

use std::io;

use clap::Parser;

use pcsaves::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = initialize_logging(cli.trace_level) {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }

    if let Err(error) = cli::run(&cli) {
        if error.is_recoverable() {
            log::error!("{}", error);
        } else {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    }
}

/// Initializes the logging framework with the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: cli::TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}
