//! Command-line interface
//!
//! - compile: print statement text, fingerprint and bindings
//! - explain: print the explain plan (or the rejection)
//! - query: run a scan against a JSON fixture

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{compile, explain, query, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_text, write_value};
