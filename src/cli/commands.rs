//! CLI command implementations
//!
//! Each command loads the config, builds a provider and runs one scan.
//! `compile` and `explain` never touch a store; `query` runs against an
//! in-process store loaded from a JSON fixture. Diagnostics go to stderr so
//! stdout holds only command output.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::compiler::CompiledQuery;
use crate::config::ProviderConfig;
use crate::error::QueryError;
use crate::executor::{QueryCursor, ResumeToken, StoreClient};
use crate::observability::Diagnostics;
use crate::provider::QueryProvider;
use crate::store::MemoryStore;

use super::args::{Cli, Command, QueryArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_response, write_text, write_value};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { query } => compile(&query),
        Command::Explain { query } => explain(&query),
        Command::Query {
            query: args,
            data,
            resume,
        } => query(&args, &data, resume.as_deref()),
    }
}

/// Print statement, fingerprint and bindings for a scan
pub fn compile(args: &QueryArgs) -> CliResult<()> {
    let provider = provider_without_store(&args.config)?;
    let compiled = provider.compile(&args.expression())?;
    write_response(describe(&compiled))
}

/// Print the explain plan for a scan. A rejected query still prints its plan.
pub fn explain(args: &QueryArgs) -> CliResult<()> {
    let provider = provider_without_store(&args.config)?;
    let plan = provider.explain(&args.expression());
    write_text(&plan.to_string())
}

/// Run a scan against a fixture, one JSON row per line, then a summary line
pub fn query(args: &QueryArgs, data: &Path, resume: Option<&str>) -> CliResult<()> {
    let config = ProviderConfig::load(&args.config)?;
    let store = MemoryStore::load(data)
        .map_err(|e| CliError::data_error(format!("{}: {}", data.display(), e)))?;
    let provider =
        QueryProvider::from_config_with_diagnostics(&config, Arc::new(store), Diagnostics::stderr())?;

    let expr = args.expression();
    let cursor = match resume {
        Some(text) => {
            let token = ResumeToken::decode(text)
                .ok_or_else(|| CliError::data_error("resume token is not valid"))?;
            provider.resume(&expr, &token)?
        }
        None => provider.cursor(&expr)?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(drain(cursor))?;

    write_response(summary)
}

async fn drain(mut cursor: QueryCursor) -> CliResult<Value> {
    let mut rows = 0u64;
    while let Some(row) = cursor.next().await.map_err(QueryError::from)? {
        write_value(&row.to_json())?;
        rows += 1;
    }

    let resume_token = cursor.resume_token().map(|t| t.encode()).transpose()?;

    Ok(json!({
        "rows": rows,
        "pages": cursor.pages_fetched(),
        "state": cursor.state().as_str(),
        "resume_token": resume_token,
    }))
}

/// Provider for commands that compile but never execute
fn provider_without_store(config_path: &Path) -> CliResult<QueryProvider> {
    let config = ProviderConfig::load(config_path)?;
    let store: Arc<dyn StoreClient> = Arc::new(MemoryStore::new());
    Ok(QueryProvider::from_config_with_diagnostics(
        &config,
        store,
        Diagnostics::stderr(),
    )?)
}

fn describe(compiled: &CompiledQuery) -> Value {
    let bindings: Vec<Value> = compiled
        .materializer()
        .bindings()
        .map(|(property, attribute, kind, nullable)| {
            json!({
                "property": property,
                "attribute": attribute,
                "kind": kind.as_str(),
                "nullable": nullable,
            })
        })
        .collect();

    json!({
        "entity": compiled.model().entity(),
        "table": compiled.table(),
        "statement": compiled.statement(),
        "fingerprint": compiled.fingerprint(),
        "bindings": bindings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarKind;
    use crate::mapping::{EntityMapping, PropertyMapping};
    use crate::query::QueryExpression;

    #[test]
    fn test_describe_lists_bindings_in_order() {
        let provider = QueryProvider::builder(Arc::new(MemoryStore::new()))
            .mapping(
                EntityMapping::new("User", "users")
                    .with_property(PropertyMapping::new("Id", ScalarKind::Uuid).stored_as("pk"))
                    .with_property(PropertyMapping::new("Age", ScalarKind::Int).nullable()),
            )
            .diagnostics(crate::observability::Diagnostics::disabled())
            .build()
            .unwrap();

        let compiled = provider.compile(&QueryExpression::scan("User")).unwrap();
        let described = describe(&compiled);

        assert_eq!(described["table"], "users");
        assert_eq!(described["statement"], r#"SELECT "pk", "Age" FROM "users""#);
        assert_eq!(described["bindings"][0]["attribute"], "pk");
        assert_eq!(described["bindings"][0]["kind"], "uuid");
        assert_eq!(described["bindings"][1]["nullable"], true);
    }
}
