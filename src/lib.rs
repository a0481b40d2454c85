//! aeroquery - typed queries over a schema-less key/value store
//!
//! Translates query expressions over typed entity shapes into flat store
//! statements plus a materializer, and runs them as paginated, cancellable
//! async enumerations.

pub mod attribute;
pub mod cli;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod observability;
pub mod provider;
pub mod query;
pub mod store;

pub use attribute::{AttributeValue, Record};
pub use codec::{ConversionError, ScalarKind, ScalarValue, TypeRegistry};
pub use compiler::{CompiledQuery, ExplainPlan};
pub use config::ProviderConfig;
pub use entity::{Entity, FromRow, FromScalar, Row};
pub use error::{QueryError, QueryResult};
pub use executor::{EntityStream, QueryCursor, ResumeToken, StoreClient};
pub use mapping::{EntityMapping, PropertyMapping};
pub use provider::{QueryProvider, QueryProviderBuilder};
pub use query::QueryExpression;
pub use store::MemoryStore;
