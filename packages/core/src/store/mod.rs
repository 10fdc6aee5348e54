//! Storage Layer
//!
//! This module contains the collaborator traits the element model talks to
//! and the in-memory reference backend:
//!
//! - `traits` - `ElementSource`, `ContentStore` and `FieldRegistry`
//! - `memory` - `MemoryStore`, implementing all three over in-memory tables

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{ContentStore, ElementSource, FieldRegistry};
