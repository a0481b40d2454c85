//! Attribute subsystem
//!
//! Wire-level currency shared by the codec, compiler, executor and stores:
//! the closed `AttributeValue` union and the `Record` map built from it.

mod record;
mod value;

pub use record::Record;
pub use value::AttributeValue;
