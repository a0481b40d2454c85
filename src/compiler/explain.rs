//! Explain output for compiled queries
//!
//! Deterministic, human-readable description of what a query compiles to,
//! or why it was rejected.

use std::fmt;

use super::compiler::CompiledQuery;
use super::plan::PlanExpr;

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Whether the query compiled
    pub accepted: bool,
    pub entity: Option<String>,
    pub table: Option<String>,
    /// Statement text sent to the store
    pub statement: Option<String>,
    pub fingerprint: Option<String>,
    /// One line per projected property
    pub bindings: Vec<String>,
    /// Lowering stages applied
    pub stages: Vec<String>,
    /// Effective page size (None = store default)
    pub page_size: Option<u32>,
    pub auto_paginate: bool,
    pub rejection_code: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled query and its effective options
    pub fn from_compiled(query: &CompiledQuery, page_size: Option<u32>, auto_paginate: bool) -> Self {
        let bindings = match &query.plan().body {
            PlanExpr::Construct { fields, .. } => fields
                .iter()
                .map(|(name, expr)| format!("{} = {}", name, expr))
                .collect(),
            other => vec![other.to_string()],
        };

        let property_count = query.model().properties().len();
        let stages = vec![
            format!("inject: parameter '{}'", query.plan().parameter),
            format!(
                "materialize: construct {} from {} properties",
                query.model().entity(),
                property_count
            ),
            format!(
                "bind: {} property accesses -> record lookups",
                property_count
            ),
        ];

        Self {
            accepted: true,
            entity: Some(query.model().entity().to_string()),
            table: Some(query.table().to_string()),
            statement: Some(query.statement().to_string()),
            fingerprint: Some(query.fingerprint().to_string()),
            bindings,
            stages,
            page_size,
            auto_paginate,
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan for a rejected query
    pub fn rejected(code: &str, reason: &str) -> Self {
        Self {
            accepted: false,
            entity: None,
            table: None,
            statement: None,
            fingerprint: None,
            bindings: Vec::new(),
            stages: Vec::new(),
            page_size: None,
            auto_paginate: false,
            rejection_code: Some(code.to_string()),
            rejection_reason: Some(reason.to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(entity) = &self.entity {
                writeln!(f, "Entity: {}", entity)?;
            }
            if let Some(table) = &self.table {
                writeln!(f, "Table: {}", table)?;
            }
            if let Some(statement) = &self.statement {
                writeln!(f, "Statement: {}", statement)?;
            }
            if let Some(fingerprint) = &self.fingerprint {
                writeln!(f, "Fingerprint: {}", fingerprint)?;
            }
            writeln!(f, "Bindings:")?;
            for binding in &self.bindings {
                writeln!(f, "  - {}", binding)?;
            }
            writeln!(f, "Stages:")?;
            for (i, stage) in self.stages.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, stage)?;
            }
            match self.page_size {
                Some(size) => writeln!(f, "Page Size: {}", size)?,
                None => writeln!(f, "Page Size: store default")?,
            }
            writeln!(
                f,
                "Pagination: {}",
                if self.auto_paginate { "follow continuation tokens" } else { "first page only" }
            )?;
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarKind;
    use crate::compiler::QueryCompiler;
    use crate::mapping::{EntityMapping, PropertyMapping};
    use crate::query::QueryModel;

    fn compiled() -> CompiledQuery {
        let mapping = EntityMapping::new("User", "users")
            .with_property(PropertyMapping::new("Id", ScalarKind::Uuid).stored_as("pk"))
            .with_property(PropertyMapping::new("Age", ScalarKind::Int).nullable());
        QueryCompiler::default()
            .compile(&QueryModel::from_mapping(&mapping).unwrap())
            .unwrap()
    }

    #[test]
    fn test_explain_accepted() {
        let explain = ExplainPlan::from_compiled(&compiled(), Some(25), true);
        assert!(explain.accepted);
        assert_eq!(
            explain.bindings,
            vec![
                "Id = convert<uuid>(record[\"pk\"])".to_string(),
                "Age = convert<int?>(record[\"Age\"])".to_string(),
            ]
        );

        let output = explain.to_string();
        assert!(output.contains("ACCEPTED"));
        assert!(output.contains(r#"Statement: SELECT "pk", "Age" FROM "users""#));
        assert!(output.contains("Page Size: 25"));
        assert!(output.contains("follow continuation tokens"));
    }

    #[test]
    fn test_explain_rejected() {
        let explain = ExplainPlan::rejected(
            "AERO_QUERY_UNSUPPORTED_OPERATION",
            "Unsupported operation 'filter': ...",
        );
        let output = explain.to_string();
        assert!(output.contains("REJECTED"));
        assert!(output.contains("AERO_QUERY_UNSUPPORTED_OPERATION"));
    }

    #[test]
    fn test_explain_deterministic() {
        let a = ExplainPlan::from_compiled(&compiled(), None, false).to_string();
        let b = ExplainPlan::from_compiled(&compiled(), None, false).to_string();
        assert_eq!(a, b);
        assert!(a.contains("store default"));
        assert!(a.contains("first page only"));
    }
}
