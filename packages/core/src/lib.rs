//! Trellis Core Content Model
//!
//! This crate provides the element tree model, criteria queries, and the
//! custom-field content layer for the Trellis content engine.
//!
//! # Architecture
//!
//! - **Nested-Set Structure**: Tree placement stored as `root`/`lft`/`rgt`/`level`
//!   coordinates, so ancestry checks are interval comparisons
//! - **Criteria Queries**: Relationship lookups build declarative criteria and
//!   delegate execution to an `ElementSource` backend
//! - **Split Content**: Locale-dependent field values live on a `Content` row,
//!   never on the element itself
//! - **Memoized Relationships**: Parent and adjacent siblings resolve once per
//!   element and then come from cache, including negative results
//!
//! # Modules
//!
//! - [`models`] - Data structures (Element, ElementCriteria, Content, Field)
//! - [`behaviors`] - Field type system for value normalization
//! - [`store`] - Backend traits and the in-memory reference store
//! - [`error`] - Crate error types

pub mod behaviors;
pub mod error;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use behaviors::*;
pub use error::*;
pub use models::*;
pub use store::*;
