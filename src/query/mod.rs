//! Query front end
//!
//! Front-end expressions, the flat query model, and the translator between
//! them.
//!
//! # Accepted shape
//!
//! An unfiltered, unordered, unprojected fetch of every mapped scalar
//! property of one entity from one table. Filters, orderings, narrowing
//! projections, joins, grouping, aggregation, limits and offsets are all
//! rejected with `AERO_QUERY_UNSUPPORTED_OPERATION`.

mod errors;
mod expr;
mod model;
mod translator;

pub use errors::{TranslationError, TranslationErrorCode, TranslationResult};
pub use expr::{QueryExpression, QueryOptions};
pub use model::{ModelKey, ProjectedProperty, QueryModel};
pub use translator::{QueryTranslator, TranslatedQuery};
