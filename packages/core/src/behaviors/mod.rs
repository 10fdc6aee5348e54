//! Field Type Behavior System
//!
//! This module provides the trait-based behavior system for field types:
//!
//! - `FieldType` trait - Value preparation hooks per field-type kind
//! - Built-in behaviors (`PlainTextField`, `NumberField`, `DateField`)
//! - `FieldTypeRegistry` - Dynamic behavior lookup and registration
//!
//! Behaviors run at two points: when a stored raw value is read
//! (`prep_value`) and when a posted value is accepted
//! (`prep_value_from_post`). The owning element is passed explicitly to each
//! hook; behaviors hold no element state between calls. A field kind with no
//! registered behavior leaves values untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::Element;

/// Value preparation hooks for one field-type kind
///
/// Both hooks default to passing the value through unchanged, so a behavior
/// only overrides the direction it cares about.
pub trait FieldType: Send + Sync {
    /// Kind tag this behavior handles
    fn kind(&self) -> &str;

    /// Prepare a stored raw value for use
    fn prep_value(&self, raw: Value, element: &Element) -> Value {
        let _ = element;
        raw
    }

    /// Prepare a posted value before it lands on content
    fn prep_value_from_post(&self, raw: Value, element: &Element) -> Value {
        let _ = element;
        raw
    }
}

/// Plain text field: trims posted strings, stringifies stored scalars
#[derive(Debug, Default)]
pub struct PlainTextField;

impl FieldType for PlainTextField {
    fn kind(&self) -> &str {
        "plainText"
    }

    fn prep_value(&self, raw: Value, _element: &Element) -> Value {
        match raw {
            Value::Null => Value::Null,
            Value::String(text) => Value::String(text),
            other => Value::String(other.to_string()),
        }
    }

    fn prep_value_from_post(&self, raw: Value, _element: &Element) -> Value {
        match raw {
            Value::String(text) => Value::String(text.trim().to_string()),
            other => other,
        }
    }
}

/// Number field: coerces posted numeric strings into numbers
#[derive(Debug, Default)]
pub struct NumberField;

impl FieldType for NumberField {
    fn kind(&self) -> &str {
        "number"
    }

    fn prep_value_from_post(&self, raw: Value, _element: &Element) -> Value {
        match raw {
            Value::String(text) => {
                let trimmed = text.trim();
                if let Ok(integer) = trimmed.parse::<i64>() {
                    return Value::from(integer);
                }
                if let Ok(float) = trimmed.parse::<f64>() {
                    if let Some(number) = serde_json::Number::from_f64(float) {
                        return Value::Number(number);
                    }
                }
                Value::String(text)
            }
            other => other,
        }
    }
}

/// Date field: normalizes values to RFC 3339 UTC strings
#[derive(Debug, Default)]
pub struct DateField;

impl FieldType for DateField {
    fn kind(&self) -> &str {
        "date"
    }

    fn prep_value(&self, raw: Value, _element: &Element) -> Value {
        normalize_datetime(raw)
    }

    fn prep_value_from_post(&self, raw: Value, _element: &Element) -> Value {
        normalize_datetime(raw)
    }
}

/// Parse RFC 3339 strings or unix timestamps into canonical UTC strings;
/// anything unparseable flows through unchanged
fn normalize_datetime(raw: Value) -> Value {
    match raw {
        Value::String(text) => match DateTime::parse_from_rfc3339(&text) {
            Ok(parsed) => Value::String(parsed.with_timezone(&Utc).to_rfc3339()),
            Err(_) => Value::String(text),
        },
        Value::Number(number) => {
            let parsed = number
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0));
            match parsed {
                Some(parsed) => Value::String(parsed.to_rfc3339()),
                None => Value::Number(number),
            }
        }
        other => other,
    }
}

/// Maps field-type kinds to their behaviors
pub struct FieldTypeRegistry {
    types: HashMap<String, Arc<dyn FieldType>>,
}

impl FieldTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in field types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlainTextField));
        registry.register(Arc::new(NumberField));
        registry.register(Arc::new(DateField));
        registry
    }

    /// Register a behavior under its kind tag, replacing any existing one
    pub fn register(&mut self, field_type: Arc<dyn FieldType>) {
        self.types
            .insert(field_type.kind().to_string(), field_type);
    }

    /// Look up the behavior for a kind
    pub fn get(&self, kind: &str) -> Option<Arc<dyn FieldType>> {
        self.types.get(kind).cloned()
    }

    /// Registered kind tags
    pub fn kinds(&self) -> Vec<&str> {
        self.types.keys().map(|kind| kind.as_str()).collect()
    }
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for FieldTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTypeRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
