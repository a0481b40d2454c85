//! Query compiler
//!
//! Runs the three lowering steps and pairs the finished materializer with
//! the statement text. A `CompiledQuery` is immutable and shared by `Arc`
//! across any number of concurrent enumerations.

use crate::codec::TypeRegistry;
use crate::query::{ModelKey, QueryModel};

use super::errors::CompilerResult;
use super::materializer::Materializer;
use super::plan::{inject, materialize, remove_bindings, BoundPlan};
use super::statement::{statement_fingerprint, statement_text};

/// Statement text plus materializer for one query model
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    key: ModelKey,
    model: QueryModel,
    statement: String,
    fingerprint: String,
    plan: BoundPlan,
    materializer: Materializer,
}

impl CompiledQuery {
    pub fn key(&self) -> &ModelKey {
        &self.key
    }

    pub fn model(&self) -> &QueryModel {
        &self.model
    }

    pub fn table(&self) -> &str {
        self.model.table()
    }

    /// Statement text sent to the store
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Base64 SHA-256 of the statement text
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn plan(&self) -> &BoundPlan {
        &self.plan
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }
}

/// Lowers query models into compiled queries
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler {
    registry: TypeRegistry,
}

impl QueryCompiler {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn compile(&self, model: &QueryModel) -> CompilerResult<CompiledQuery> {
        let injected = inject(model);
        let plan = materialize(injected);
        let bound = remove_bindings(plan)?;
        let materializer = Materializer::from_plan(&bound, &self.registry)?;

        let statement = statement_text(model);
        let fingerprint = statement_fingerprint(&statement);

        Ok(CompiledQuery {
            key: model.key(),
            model: model.clone(),
            statement,
            fingerprint,
            plan: bound,
            materializer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeValue, Record};
    use crate::codec::{ScalarKind, ScalarValue};
    use crate::mapping::{EntityMapping, PropertyMapping};

    fn model() -> QueryModel {
        let mapping = EntityMapping::new("Order", "orders")
            .with_property(PropertyMapping::new("Id", ScalarKind::Long).stored_as("order_id"))
            .with_property(PropertyMapping::new("Paid", ScalarKind::Bool));
        QueryModel::from_mapping(&mapping).unwrap()
    }

    #[test]
    fn test_compile_produces_statement_and_materializer() {
        let compiled = QueryCompiler::default().compile(&model()).unwrap();

        assert_eq!(compiled.statement(), r#"SELECT "order_id", "Paid" FROM "orders""#);
        assert_eq!(compiled.table(), "orders");
        assert!(compiled.plan().body.is_bound());

        let row = compiled
            .materializer()
            .materialize(&Record::new().with("order_id", AttributeValue::number(9)))
            .unwrap();
        assert_eq!(row.get("Id"), Some(&ScalarValue::Long(9)));
        assert_eq!(row.get("Paid"), Some(&ScalarValue::Bool(false)));
    }

    #[test]
    fn test_compile_twice_is_identical() {
        let compiler = QueryCompiler::default();
        let a = compiler.compile(&model()).unwrap();
        let b = compiler.compile(&model()).unwrap();

        assert_eq!(a.statement(), b.statement());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.key(), b.key());
        assert_eq!(a.plan(), b.plan());
    }
}
