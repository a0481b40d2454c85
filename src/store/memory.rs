//! In-process store client
//!
//! Holds tables of records in memory and answers the flat select
//! statements the compiler emits. Pages are cut by the request limit (or
//! the store's own default) and continued with opaque tokens.
//!
//! Also supports scripted transient failures and artificial latency so
//! retry and cancellation behavior can be exercised without a network.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::attribute::Record;
use crate::executor::{Page, StatementRequest, StoreClient, StoreError, StoreFuture, StoreResult};

/// Page size used when a request carries no limit
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    default_page_size: u32,
    latency: Option<Duration>,
    failures: Mutex<VecDeque<StoreError>>,
    requests: AtomicU64,
    request_log: Mutex<Vec<StatementRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            default_page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            failures: Mutex::new(VecDeque::new()),
            requests: AtomicU64::new(0),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Loads tables from a JSON fixture: `{ "table": [ {record}, ... ] }`
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let tables: BTreeMap<String, Vec<Record>> = serde_json::from_value(value)?;
        let store = Self::new();
        for (name, records) in tables {
            store.insert_table(name, records);
        }
        Ok(store)
    }

    /// Loads a JSON fixture file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Self::from_json(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// Delays every response
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert_table(&self, name: impl Into<String>, records: Vec<Record>) {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(name.into(), records);
        }
    }

    /// Makes the next request fail with `error` (queued, one per request)
    pub fn fail_next(&self, error: StoreError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Requests received, including failed ones
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn request_log(&self) -> Vec<StatementRequest> {
        self.request_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn answer(&self, request: &StatementRequest) -> StoreResult<Page> {
        let scripted = self.failures.lock().ok().and_then(|mut f| f.pop_front());
        if let Some(error) = scripted {
            return Err(error);
        }

        let select = parse_select(&request.statement)?;
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::fatal("table lock poisoned"))?;
        let records = tables
            .get(&select.table)
            .ok_or_else(|| StoreError::fatal(format!("table '{}' does not exist", select.table)))?;

        let offset = match &request.next_token {
            Some(token) => decode_token(token, &select.table)?,
            None => 0,
        };
        let limit = request.limit.unwrap_or(self.default_page_size).max(1) as usize;
        let end = offset.saturating_add(limit).min(records.len());

        let page: Vec<Record> = records
            .get(offset..end)
            .unwrap_or(&[])
            .iter()
            .map(|r| r.project(&select.columns))
            .collect();

        let next_token = if end < records.len() {
            Some(encode_token(&select.table, end))
        } else {
            None
        };

        Ok(Page::new(page, next_token))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MemoryStore {
    fn execute(&self, request: StatementRequest) -> StoreFuture<'_> {
        Box::pin(async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut log) = self.request_log.lock() {
                log.push(request.clone());
            }
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.answer(&request)
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Select {
    table: String,
    columns: Vec<String>,
}

/// Parses `SELECT "a", "b" FROM "table"`
fn parse_select(statement: &str) -> StoreResult<Select> {
    let invalid = || StoreError::fatal(format!("unsupported statement: {}", statement));

    let mut rest = statement.strip_prefix("SELECT ").ok_or_else(invalid)?;
    let mut columns = Vec::new();
    loop {
        let (column, remaining) = parse_identifier(rest).ok_or_else(invalid)?;
        columns.push(column);

        if let Some(next) = remaining.strip_prefix(", ") {
            rest = next;
            continue;
        }
        let from = remaining.strip_prefix(" FROM ").ok_or_else(invalid)?;
        let (table, tail) = parse_identifier(from).ok_or_else(invalid)?;
        if !tail.trim().is_empty() {
            return Err(invalid());
        }
        return Ok(Select { table, columns });
    }
}

/// Reads one double-quoted identifier; `""` inside is a literal quote
fn parse_identifier(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut ident = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '"' {
            if let Some((_, '"')) = chars.peek() {
                chars.next();
                ident.push('"');
                continue;
            }
            return Some((ident, &body[i + 1..]));
        }
        ident.push(c);
    }
    None
}

fn encode_token(table: &str, offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}\n{}", table, offset))
}

fn decode_token(token: &str, table: &str) -> StoreResult<usize> {
    let invalid = || StoreError::fatal(format!("invalid continuation token '{}'", token));

    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (token_table, offset) = text.rsplit_once('\n').ok_or_else(invalid)?;
    if token_table != table {
        return Err(StoreError::fatal(format!(
            "continuation token for table '{}' used against table '{}'",
            token_table, table
        )));
    }
    offset.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::from_json(json!({
            "users": [
                {"pk": {"S": "u1"}, "age": {"N": "30"}, "secret": {"S": "x"}},
                {"pk": {"S": "u2"}, "age": {"N": "31"}},
                {"pk": {"S": "u3"}}
            ]
        }))
        .unwrap()
    }

    fn request(token: Option<String>, limit: Option<u32>) -> StatementRequest {
        StatementRequest {
            statement: r#"SELECT "pk", "age" FROM "users""#.into(),
            next_token: token,
            limit,
        }
    }

    #[test]
    fn test_parse_select() {
        let select = parse_select(r#"SELECT "a", "b""c" FROM "my table""#).unwrap();
        assert_eq!(select.table, "my table");
        assert_eq!(select.columns, vec!["a".to_string(), "b\"c".to_string()]);

        assert!(parse_select("DELETE FROM users").is_err());
        assert!(parse_select(r#"SELECT "a" FROM "t" WHERE x"#).is_err());
        assert!(parse_select(r#"SELECT "a FROM "t""#).is_err());
    }

    #[tokio::test]
    async fn test_pages_and_tokens() {
        let store = store();

        let first = store.execute(request(None, Some(2))).await.unwrap();
        assert_eq!(first.records.len(), 2);
        let token = first.next_token.clone().unwrap();

        let second = store.execute(request(Some(token), Some(2))).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert!(second.next_token.is_none());
        assert_eq!(store.requests(), 2);
    }

    #[tokio::test]
    async fn test_store_default_page_size_without_limit() {
        let store = store().with_default_page_size(2);
        let page = store.execute(request(None, None)).await.unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.next_token.is_some());
    }

    #[tokio::test]
    async fn test_records_projected_to_statement_columns() {
        let page = store().execute(request(None, None)).await.unwrap();
        assert_eq!(page.records.len(), 3);
        assert!(page.records[0].get("secret").is_none());
        assert_eq!(
            page.records[0].get("age"),
            Some(&AttributeValue::Number("30".into()))
        );
    }

    #[tokio::test]
    async fn test_unknown_table_is_fatal() {
        let store = store();
        let err = store
            .execute(StatementRequest {
                statement: r#"SELECT "a" FROM "ghosts""#.into(),
                next_token: None,
                limit: None,
            })
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_scripted_failure_then_success() {
        let store = store();
        store.fail_next(StoreError::transient("throttled"));

        assert!(store.execute(request(None, None)).await.unwrap_err().is_transient());
        assert!(store.execute(request(None, None)).await.is_ok());
        assert_eq!(store.request_log().len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_token_rejected() {
        let store = store();
        store.insert_table("orders", vec![Record::new(); 3]);
        let err = store
            .execute(request(Some(encode_token("orders", 1)), None))
            .await
            .unwrap_err();
        assert!(err.message().contains("'orders'"));
    }
}
