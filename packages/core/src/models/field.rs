//! Field Schema Types
//!
//! This module contains the data structures describing custom fields and the
//! ordered field layouts attached to element types. Definitions are resolved
//! through the `FieldRegistry` collaborator; the structures here carry no
//! storage logic of their own.
//!
//! ## Contexts
//!
//! Every field lives in a context (default `"global"`). The same handle can
//! exist in several contexts without colliding, and elements resolve handles
//! against their own `field_context`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default context for fields and elements
pub const DEFAULT_FIELD_CONTEXT: &str = "global";

fn default_context() -> String {
    DEFAULT_FIELD_CONTEXT.to_string()
}

/// Definition of a single custom field
///
/// The `kind` tag selects the field-type behavior used to prepare values;
/// a kind with no registered behavior leaves values untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique identifier, assigned by the registry backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Handle used to address the field in content and post data
    pub handle: String,

    /// Human-readable name
    pub name: String,

    /// Context the field is registered under
    #[serde(default = "default_context")]
    pub context: String,

    /// Field-type kind (e.g., "plainText", "number", "date")
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether a value is required on save
    #[serde(default)]
    pub required: bool,

    /// Type-specific settings
    #[serde(default)]
    pub settings: Value,
}

impl Field {
    /// Create a new field in the default context
    pub fn new(handle: String, name: String, kind: String) -> Self {
        Self {
            id: None,
            handle,
            name,
            context: default_context(),
            kind,
            required: false,
            settings: Value::Null,
        }
    }

    /// Set the field context
    pub fn with_context(mut self, context: String) -> Self {
        self.context = context;
        self
    }

    /// Mark the field as required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set type-specific settings
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }
}

/// Ordered list of fields attached to an element type
///
/// The order is meaningful: post data is consumed field by field in layout
/// order, so behaviors run deterministically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    /// Element type the layout belongs to
    pub element_type: String,

    /// Fields in layout order
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FieldLayout {
    /// Create an empty layout for an element type
    pub fn new(element_type: String) -> Self {
        Self {
            element_type,
            fields: Vec::new(),
        }
    }

    /// Append a field to the layout
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Get a field by handle
    pub fn field(&self, handle: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.handle == handle)
    }

    /// Handles in layout order
    pub fn handles(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.handle.as_str()).collect()
    }
}
