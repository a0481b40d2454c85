//! Compiler Determinism Tests
//!
//! Test Categories:
//! 1. Byte-identical statement text across providers
//! 2. Cache keyed by model content
//! 3. End-to-end typed materialization across every scalar kind

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use aeroquery::codec::{ConversionResult, ScalarKind};
use aeroquery::entity::{Entity, FromRow, Row};
use aeroquery::mapping::{EntityMapping, PropertyMapping};
use aeroquery::observability::Diagnostics;
use aeroquery::provider::QueryProvider;
use aeroquery::query::QueryExpression;
use aeroquery::store::MemoryStore;

fn mapping() -> EntityMapping {
    EntityMapping::new("Account", "accounts")
        .with_property(PropertyMapping::new("Id", ScalarKind::Uuid).stored_as("pk"))
        .with_property(PropertyMapping::new("Owner", ScalarKind::String))
        .with_property(PropertyMapping::new("Active", ScalarKind::Bool))
        .with_property(PropertyMapping::new("Logins", ScalarKind::Long))
        .with_property(PropertyMapping::new("Balance", ScalarKind::Decimal))
        .with_property(PropertyMapping::new("Score", ScalarKind::Double))
        .with_property(PropertyMapping::new("Opened", ScalarKind::DateTime))
        .with_property(PropertyMapping::new("Closed", ScalarKind::DateTime).nullable())
}

fn provider(store: Arc<MemoryStore>) -> QueryProvider {
    QueryProvider::builder(store)
        .mapping(mapping())
        .diagnostics(Diagnostics::disabled())
        .build()
        .unwrap()
}

// =============================================================================
// STATEMENT DETERMINISM
// =============================================================================

/// Two independent providers compile the same model to the same bytes.
#[test]
fn test_statement_identical_across_providers() {
    let a = provider(Arc::new(MemoryStore::new()));
    let b = provider(Arc::new(MemoryStore::new()));

    let first = a.compile(&QueryExpression::scan("Account")).unwrap();
    let second = b.compile(&QueryExpression::scan("Account")).unwrap();

    assert_eq!(first.statement(), second.statement());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.plan(), second.plan());
    assert_eq!(
        first.statement(),
        r#"SELECT "pk", "Owner", "Active", "Logins", "Balance", "Score", "Opened", "Closed" FROM "accounts""#
    );
}

/// Explain output is stable across runs.
#[test]
fn test_explain_stable() {
    let a = provider(Arc::new(MemoryStore::new()));
    let b = provider(Arc::new(MemoryStore::new()));

    let expr = QueryExpression::scan("Account").with_page_size(10);
    assert_eq!(a.explain(&expr).to_string(), b.explain(&expr).to_string());
}

// =============================================================================
// CACHE
// =============================================================================

/// Options and identity projections do not change the compiled shape.
#[test]
fn test_cache_shared_by_equivalent_expressions() {
    let provider = provider(Arc::new(MemoryStore::new()));
    let all = [
        "Id", "Owner", "Active", "Logins", "Balance", "Score", "Opened", "Closed",
    ];

    let plain = provider.compile(&QueryExpression::scan("Account")).unwrap();
    let paged = provider
        .compile(&QueryExpression::scan("Account").with_page_size(3))
        .unwrap();
    let projected = provider
        .compile(&QueryExpression::scan("Account").select(all))
        .unwrap();

    assert!(Arc::ptr_eq(&plain, &paged));
    assert!(Arc::ptr_eq(&plain, &projected));
    assert_eq!(provider.cache().len(), 1);
    assert_eq!(provider.cache().compilations(), 1);
    assert_eq!(provider.metrics().cache_hits, 2);
}

/// Compilation is usable from many threads at once.
#[test]
fn test_concurrent_compilation_converges() {
    let provider = Arc::new(provider(Arc::new(MemoryStore::new())));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = Arc::clone(&provider);
            std::thread::spawn(move || {
                provider
                    .compile(&QueryExpression::scan("Account"))
                    .unwrap()
                    .fingerprint()
                    .to_string()
            })
        })
        .collect();

    let fingerprints: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(fingerprints.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(provider.cache().compilations(), 1);
}

// =============================================================================
// TYPED MATERIALIZATION
// =============================================================================

#[derive(Debug)]
struct Account {
    id: Uuid,
    owner: String,
    active: bool,
    logins: i64,
    balance: Decimal,
    score: f64,
    opened: DateTime<Utc>,
    closed: Option<DateTime<Utc>>,
}

impl FromRow for Account {
    fn from_row(row: Row) -> ConversionResult<Self> {
        Ok(Account {
            id: row.get_as("Id")?,
            owner: row.get_as("Owner")?,
            active: row.get_as("Active")?,
            logins: row.get_as("Logins")?,
            balance: row.get_as("Balance")?,
            score: row.get_as("Score")?,
            opened: row.get_as("Opened")?,
            closed: row.get_as("Closed")?,
        })
    }
}

impl Entity for Account {
    const NAME: &'static str = "Account";

    fn mapping() -> EntityMapping {
        mapping()
    }
}

#[tokio::test]
async fn test_every_kind_materializes() {
    let store = Arc::new(
        MemoryStore::from_json(json!({
            "accounts": [
                {
                    "pk": {"S": "5f0c3c5e-8a4b-4c1e-9a53-0b8f6f1d2c3a"},
                    "Owner": {"S": "ada"},
                    "Active": {"BOOL": true},
                    "Logins": {"N": "9007199254740993"},
                    "Balance": {"N": "12345.6789"},
                    "Score": {"N": "0.5"},
                    "Opened": {"S": "2024-03-01T12:00:00Z"},
                    "Closed": {"NULL": true}
                },
                {
                    "pk": {"S": "00000000-0000-0000-0000-000000000001"},
                    "Logins": {"N": "0"},
                    "Balance": {"N": "0"},
                    "Score": {"N": "-1e3"},
                    "Opened": {"N": "0"}
                }
            ]
        }))
        .unwrap(),
    );
    let provider = QueryProvider::builder(store)
        .entity::<Account>()
        .diagnostics(Diagnostics::disabled())
        .build()
        .unwrap();

    let accounts: Vec<Account> = provider.collect(&Account::query()).await.unwrap();
    assert_eq!(accounts.len(), 2);

    let first = &accounts[0];
    assert_eq!(first.id.to_string(), "5f0c3c5e-8a4b-4c1e-9a53-0b8f6f1d2c3a");
    assert_eq!(first.owner, "ada");
    assert!(first.active);
    assert_eq!(first.logins, 9_007_199_254_740_993);
    assert_eq!(first.balance.to_string(), "12345.6789");
    assert_eq!(first.score, 0.5);
    assert_eq!(first.opened, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    assert_eq!(first.closed, None);

    // Sparse string/bool degrade to defaults; "0" is the epoch
    let second = &accounts[1];
    assert_eq!(second.owner, "");
    assert!(!second.active);
    assert_eq!(second.score, -1000.0);
    assert_eq!(second.opened, Utc.timestamp_opt(0, 0).unwrap());
    assert_eq!(second.closed, None);
}
