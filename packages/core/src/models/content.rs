//! Content Types
//!
//! This module defines the content row bound to an element plus the post
//! payload accepted by `Element::set_content_from_post`. Content is stored
//! per element and locale; custom field values live in a JSON map keyed by
//! field handle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::element::Element;

/// Localized content row for one element
///
/// Carries the element's title plus all custom field values. The element id
/// and locale identify which element instance the row belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Unique identifier, assigned by the content store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Id of the owning element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,

    /// Locale of the owning element instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Element title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Custom field values keyed by handle
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Content {
    /// Create an empty content row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blank content row bound to an element
    pub fn for_element(element: &Element) -> Self {
        Self {
            id: None,
            element_id: element.id.clone(),
            locale: element.locale.clone(),
            title: None,
            fields: Map::new(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// Set a field value by handle
    pub fn with_field_value(mut self, handle: String, value: Value) -> Self {
        self.fields.insert(handle, value);
        self
    }

    /// Get a field value by handle
    pub fn field_value(&self, handle: &str) -> Option<&Value> {
        self.fields.get(handle)
    }

    /// Set a field value by handle
    pub fn set_field_value(&mut self, handle: String, value: Value) {
        self.fields.insert(handle, value);
    }
}

/// Post payload accepted by `Element::set_content_from_post`
///
/// The location form mirrors a namespaced form submission: `values` holds
/// what was posted under `location`, and `files` names uploads as
/// `location.handle`. The direct form (built via `From<Map>`) carries values
/// only, so the upload branch can never trigger for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostedContent {
    /// Namespace the values were submitted under
    pub location: Option<String>,

    /// Submitted field values keyed by handle
    pub values: Map<String, Value>,

    /// Uploaded file names, e.g. `fields.avatar`
    pub files: HashSet<String>,
}

impl PostedContent {
    /// Create a payload submitted under a namespace
    pub fn at_location(location: String, values: Map<String, Value>) -> Self {
        Self {
            location: Some(location),
            values,
            files: HashSet::new(),
        }
    }

    /// Record an uploaded file name
    pub fn with_file(mut self, name: String) -> Self {
        self.files.insert(name);
        self
    }
}

impl From<Map<String, Value>> for PostedContent {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            location: None,
            values,
            files: HashSet::new(),
        }
    }
}
