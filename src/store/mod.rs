//! Store clients shipped with the crate

mod memory;

pub use memory::{MemoryStore, DEFAULT_PAGE_SIZE};
