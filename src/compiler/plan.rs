//! Materializer plan IR and the three lowering steps
//!
//! Each step is a pure function from one named representation to the next:
//!
//! ```text
//! QueryModel --inject--> InjectedPlan --materialize--> MaterializationPlan
//!            --remove_bindings--> BoundPlan
//! ```
//!
//! - Injection introduces the raw record parameter the materializer receives
//! - Materialization builds the entity construction from abstract property
//!   accesses, each wrapped in a conversion to the property's kind
//! - Binding removal replaces every abstract property access with a concrete
//!   lookup of the store attribute name
//!
//! A `BoundPlan` never contains a `PropertyAccess` node.

use std::fmt;

use crate::codec::ScalarKind;
use crate::query::QueryModel;

use super::errors::{CompilerError, CompilerResult};

/// Name of the injected record parameter
pub const RECORD_PARAMETER: &str = "record";

/// Plan expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanExpr {
    /// The raw record the materializer is called with
    Parameter { name: String },
    /// Abstract "read property P from the raw record"
    PropertyAccess {
        source: Box<PlanExpr>,
        property: String,
    },
    /// Concrete lookup of a store attribute by name
    RecordLookup {
        source: Box<PlanExpr>,
        attribute: String,
    },
    /// Registry conversion to a scalar kind
    Convert {
        input: Box<PlanExpr>,
        kind: ScalarKind,
        nullable: bool,
        property: String,
    },
    /// Entity construction from named fields, in projection order
    Construct {
        entity: String,
        fields: Vec<(String, PlanExpr)>,
    },
}

impl PlanExpr {
    pub fn parameter(name: impl Into<String>) -> Self {
        PlanExpr::Parameter { name: name.into() }
    }

    pub fn node_name(&self) -> &'static str {
        match self {
            PlanExpr::Parameter { .. } => "parameter",
            PlanExpr::PropertyAccess { .. } => "property access",
            PlanExpr::RecordLookup { .. } => "record lookup",
            PlanExpr::Convert { .. } => "convert",
            PlanExpr::Construct { .. } => "construct",
        }
    }

    /// True when no abstract property access remains in the tree
    pub fn is_bound(&self) -> bool {
        match self {
            PlanExpr::Parameter { .. } => true,
            PlanExpr::PropertyAccess { .. } => false,
            PlanExpr::RecordLookup { source, .. } => source.is_bound(),
            PlanExpr::Convert { input, .. } => input.is_bound(),
            PlanExpr::Construct { fields, .. } => fields.iter().all(|(_, expr)| expr.is_bound()),
        }
    }
}

impl fmt::Display for PlanExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanExpr::Parameter { name } => write!(f, "{}", name),
            PlanExpr::PropertyAccess { source, property } => write!(f, "{}.{}", source, property),
            PlanExpr::RecordLookup { source, attribute } => {
                write!(f, "{}[{:?}]", source, attribute)
            }
            PlanExpr::Convert {
                input,
                kind,
                nullable,
                ..
            } => {
                let marker = if *nullable { "?" } else { "" };
                write!(f, "convert<{}{}>({})", kind, marker, input)
            }
            PlanExpr::Construct { entity, fields } => {
                write!(f, "{} {{ ", entity)?;
                for (i, (name, expr)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, expr)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Step 1 output: the model with its record parameter bound
#[derive(Debug, Clone, PartialEq)]
pub struct InjectedPlan {
    pub model: QueryModel,
    pub parameter: PlanExpr,
}

/// Step 2 output: storage-agnostic entity construction
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationPlan {
    pub model: QueryModel,
    pub parameter: PlanExpr,
    pub body: PlanExpr,
}

/// Step 3 output: construction over concrete record lookups only
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPlan {
    pub model: QueryModel,
    pub parameter: PlanExpr,
    pub body: PlanExpr,
}

/// Step 1: injection
pub fn inject(model: &QueryModel) -> InjectedPlan {
    InjectedPlan {
        model: model.clone(),
        parameter: PlanExpr::parameter(RECORD_PARAMETER),
    }
}

/// Step 2: materialization
pub fn materialize(injected: InjectedPlan) -> MaterializationPlan {
    let fields = injected
        .model
        .properties()
        .iter()
        .map(|p| {
            let access = PlanExpr::PropertyAccess {
                source: Box::new(injected.parameter.clone()),
                property: p.property.clone(),
            };
            let convert = PlanExpr::Convert {
                input: Box::new(access),
                kind: p.kind,
                nullable: p.nullable,
                property: p.property.clone(),
            };
            (p.property.clone(), convert)
        })
        .collect();

    let body = PlanExpr::Construct {
        entity: injected.model.entity().to_string(),
        fields,
    };

    MaterializationPlan {
        model: injected.model,
        parameter: injected.parameter,
        body,
    }
}

/// Step 3: binding removal
pub fn remove_bindings(plan: MaterializationPlan) -> CompilerResult<BoundPlan> {
    let body = bind(&plan.model, plan.body)?;
    if !body.is_bound() {
        return Err(CompilerError::plan_shape("binding removal", "property access"));
    }
    Ok(BoundPlan {
        model: plan.model,
        parameter: plan.parameter,
        body,
    })
}

fn bind(model: &QueryModel, expr: PlanExpr) -> CompilerResult<PlanExpr> {
    match expr {
        PlanExpr::Parameter { name } => Ok(PlanExpr::Parameter { name }),
        PlanExpr::PropertyAccess { source, property } => {
            let projected = model
                .property(&property)
                .ok_or_else(|| CompilerError::unbound_property(&property, model.table()))?;
            Ok(PlanExpr::RecordLookup {
                source: Box::new(bind(model, *source)?),
                attribute: projected.attribute.clone(),
            })
        }
        PlanExpr::RecordLookup { source, attribute } => Ok(PlanExpr::RecordLookup {
            source: Box::new(bind(model, *source)?),
            attribute,
        }),
        PlanExpr::Convert {
            input,
            kind,
            nullable,
            property,
        } => Ok(PlanExpr::Convert {
            input: Box::new(bind(model, *input)?),
            kind,
            nullable,
            property,
        }),
        PlanExpr::Construct { entity, fields } => {
            let fields = fields
                .into_iter()
                .map(|(name, expr)| Ok((name, bind(model, expr)?)))
                .collect::<CompilerResult<Vec<_>>>()?;
            Ok(PlanExpr::Construct { entity, fields })
        }
    }
}
