//! aeroquery CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; all logic lives in
//! the library. Errors go to stderr with a non-zero exit.

use aeroquery::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
