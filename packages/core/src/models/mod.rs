//! Data Models
//!
//! This module contains the core data structures used throughout Trellis:
//!
//! - `Element` - Universal content model with structure placement and caches
//! - `ElementCriteria` - Declarative query over elements
//! - `Content` - Per-locale custom field values belonging to an element
//! - `Field` / `FieldLayout` - Custom field definitions and their ordering
//! - `Memo` - Three-state cache cell for resolved relationships
//!
//! Elements carry their tree position as nested-set coordinates; everything
//! that varies per locale lives on the `Content` row instead.

pub mod content;
pub mod criteria;
pub mod element;
pub mod field;
pub mod memo;

pub use content::{Content, PostedContent};
pub use criteria::{ElementCriteria, OrderBy, StructureRef};
pub use element::{Element, ElementStatus, ValidationError};
pub use field::{Field, FieldLayout, DEFAULT_FIELD_CONTEXT};
pub use memo::Memo;
