//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroquery compile --config <path> --entity <name>
//! - aeroquery explain --config <path> --entity <name>
//! - aeroquery query --config <path> --entity <name> --data <fixture>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::query::QueryExpression;

/// aeroquery - typed queries over a schema-less key/value store
#[derive(Parser, Debug)]
#[command(name = "aeroquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Path to configuration file
    #[arg(long, default_value = "./aeroquery.json")]
    pub config: PathBuf,

    /// Entity shape to scan
    #[arg(long)]
    pub entity: String,

    /// Page size requested from the store
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Read only the first page
    #[arg(long)]
    pub no_paginate: bool,
}

impl QueryArgs {
    /// Query expression described by the arguments
    pub fn expression(&self) -> QueryExpression {
        let mut expr = QueryExpression::scan(&self.entity);
        if let Some(page_size) = self.page_size {
            expr = expr.with_page_size(page_size);
        }
        if self.no_paginate {
            expr = expr.without_pagination();
        }
        expr
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a full scan and print its statement and bindings
    Compile {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print the explain plan of a full scan
    Explain {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run a full scan against a JSON fixture and print one row per line
    Query {
        #[command(flatten)]
        query: QueryArgs,

        /// JSON fixture: { "table": [ {record}, ... ] }
        #[arg(long)]
        data: PathBuf,

        /// Resume token printed by an earlier --no-paginate run
        #[arg(long)]
        resume: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::try_parse_from([
            "aeroquery",
            "query",
            "--config",
            "cfg.json",
            "--entity",
            "User",
            "--data",
            "users.json",
            "--page-size",
            "10",
            "--no-paginate",
        ])
        .unwrap();

        match cli.command {
            Command::Query { query, data, resume } => {
                assert_eq!(query.entity, "User");
                assert_eq!(data, PathBuf::from("users.json"));
                assert!(resume.is_none());
                assert_eq!(
                    query.expression(),
                    QueryExpression::scan("User")
                        .with_page_size(10)
                        .without_pagination()
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_plain_scan_expression() {
        let cli =
            Cli::try_parse_from(["aeroquery", "compile", "--entity", "User"]).unwrap();
        match cli.command {
            Command::Compile { query } => {
                assert_eq!(query.config, PathBuf::from("./aeroquery.json"));
                assert_eq!(query.expression(), QueryExpression::scan("User"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_entity_required() {
        assert!(Cli::try_parse_from(["aeroquery", "explain"]).is_err());
    }
}
