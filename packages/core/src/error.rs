//! Crate Error Types
//!
//! This module defines the error surface for element operations. Collaborator
//! failures (source, content store, field registry) pass through untranslated
//! in the `Store` variant; a relationship that resolves to nothing is `None`,
//! never an error.

use thiserror::Error;

use crate::models::ValidationError;

/// Element operation errors
///
/// Provides the error cases element accessors can raise, with collaborator
/// errors chained transparently.
#[derive(Error, Debug)]
pub enum ElementError {
    /// No field registered under the handle in the element's context
    #[error("No field exists with the handle '{handle}'")]
    FieldNotFound { handle: String },

    /// Dynamic attribute name matched neither a built-in nor a field handle
    #[error("Unknown attribute: {name}")]
    UnknownAttribute { name: String },

    /// Attempted write to a derived or immutable attribute
    #[error("Attribute is read-only: {name}")]
    ReadOnlyAttribute { name: String },

    /// Writable attribute given a value of the wrong shape
    #[error("Invalid value for attribute: {name}")]
    InvalidAttributeValue { name: String },

    /// Element state validation failed
    #[error("Element validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Collaborator operation failed
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ElementError {
    /// Create a field not found error
    pub fn field_not_found(handle: impl Into<String>) -> Self {
        Self::FieldNotFound {
            handle: handle.into(),
        }
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(name: impl Into<String>) -> Self {
        Self::UnknownAttribute { name: name.into() }
    }

    /// Create a read-only attribute error
    pub fn read_only_attribute(name: impl Into<String>) -> Self {
        Self::ReadOnlyAttribute { name: name.into() }
    }

    /// Create an invalid attribute value error
    pub fn invalid_attribute_value(name: impl Into<String>) -> Self {
        Self::InvalidAttributeValue { name: name.into() }
    }
}
