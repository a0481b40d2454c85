//! Compiled materializer
//!
//! Finalizes a `BoundPlan` into a flat list of field readers. The result
//! holds no mutable state and is shared freely across enumerations.

use std::sync::Arc;

use crate::attribute::Record;
use crate::codec::{read_scalar, ConversionResult, ReadFn, ScalarKind, TypeRegistry};
use crate::entity::Row;

use super::errors::{CompilerError, CompilerResult};
use super::plan::{BoundPlan, PlanExpr};

const STAGE: &str = "finalize";

#[derive(Debug)]
struct FieldReader {
    property: String,
    attribute: String,
    kind: ScalarKind,
    nullable: bool,
    read: ReadFn,
}

/// Callable `Record -> Row` function
#[derive(Debug, Clone)]
pub struct Materializer {
    entity: Arc<str>,
    fields: Arc<[FieldReader]>,
}

impl Materializer {
    /// Lowers a bound plan.
    ///
    /// Accepts only `Construct` over `Convert(RecordLookup(Parameter))` fields.
    pub fn from_plan(plan: &BoundPlan, registry: &TypeRegistry) -> CompilerResult<Self> {
        let (entity, fields) = match &plan.body {
            PlanExpr::Construct { entity, fields } => (entity, fields),
            other => return Err(CompilerError::plan_shape(STAGE, other.node_name())),
        };

        let mut readers = Vec::with_capacity(fields.len());
        for (name, expr) in fields {
            let (input, kind, nullable) = match expr {
                PlanExpr::Convert {
                    input,
                    kind,
                    nullable,
                    ..
                } => (input, *kind, *nullable),
                other => return Err(CompilerError::plan_shape(STAGE, other.node_name())),
            };

            let attribute = match input.as_ref() {
                PlanExpr::RecordLookup { source, attribute } => match source.as_ref() {
                    PlanExpr::Parameter { .. } => attribute,
                    other => return Err(CompilerError::plan_shape(STAGE, other.node_name())),
                },
                other => return Err(CompilerError::plan_shape(STAGE, other.node_name())),
            };

            readers.push(FieldReader {
                property: name.clone(),
                attribute: attribute.clone(),
                kind,
                nullable,
                read: registry.reader(kind),
            });
        }

        Ok(Self {
            entity: Arc::from(entity.as_str()),
            fields: readers.into(),
        })
    }

    /// Builds one entity from one record.
    ///
    /// Either every field converts or the whole record fails; the error names
    /// the property and the attribute it was read from.
    pub fn materialize(&self, record: &Record) -> ConversionResult<Row> {
        let mut row = Row::with_capacity(self.entity.as_ref(), self.fields.len());
        for field in self.fields.iter() {
            let value = read_scalar(field.read, record.get(&field.attribute), field.nullable)
                .map_err(|e| e.with_property(&field.property, &field.attribute))?;
            row.push(field.property.as_str(), value);
        }
        Ok(row)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// (property, attribute, kind, nullable) per field, in order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str, ScalarKind, bool)> {
        self.fields
            .iter()
            .map(|f| (f.property.as_str(), f.attribute.as_str(), f.kind, f.nullable))
    }
}
