//! Statement text generation
//!
//! Emits the flat select statement sent to the store:
//!
//! ```text
//! SELECT "pk", "Name", "Age" FROM "users"
//! ```
//!
//! Identifiers are always double-quoted with embedded quotes doubled.
//! No predicates, ordering or limits are ever emitted; paging is carried
//! by the request, not the text. Output depends only on the model.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::query::QueryModel;

/// Quotes one identifier
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Select-all-declared-attributes statement for a model
pub fn statement_text(model: &QueryModel) -> String {
    let columns: Vec<String> = model
        .properties()
        .iter()
        .map(|p| quote_identifier(&p.attribute))
        .collect();

    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_identifier(model.table())
    )
}

/// Stable fingerprint of a statement: base64 of its SHA-256 digest
pub fn statement_fingerprint(statement: &str) -> String {
    let digest = Sha256::digest(statement.as_bytes());
    STANDARD.encode(digest)
}
