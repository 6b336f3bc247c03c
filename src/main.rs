//! posepaint - Command-line tool for propagating painted frames across poses

use std::process::ExitCode;

use posepaint::cli;

fn main() -> ExitCode {
    cli::run()
}
