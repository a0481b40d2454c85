//! Type conversion subsystem
//!
//! Converts between typed scalars and store attribute values.
//!
//! # Rules
//!
//! - Pure and stateless: the registry holds no data
//! - Total on its declared kinds, loud outside them
//! - Malformed numeric or identifier text is always an error
//! - Sparse string/bool attributes degrade to "" / false
//!
//! Complex shapes (nested maps, lists) are not scalars and are never
//! handled here.

mod errors;
mod kind;
mod registry;

pub use errors::{ConversionError, ConversionErrorCode, ConversionResult};
pub use kind::{ScalarKind, ScalarValue};
pub use registry::{read_scalar, ReadFn, TypeRegistry};
