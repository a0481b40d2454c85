//! Entity mapping metadata
//!
//! Declares how entity shapes map onto store tables and attributes.
//! The translator never infers names; everything comes from here.

mod errors;
mod provider;
mod types;

pub use errors::{MappingError, MappingErrorCode, MappingResult};
pub use provider::{MappingCache, MappingProvider, StaticMappings};
pub use types::{EntityMapping, PropertyMapping};
