//! Element Criteria
//!
//! This module defines the declarative query model used to fetch elements:
//!
//! - `ElementCriteria` - Filter set plus ordering, executed by an `ElementSource`
//! - `StructureRef` - Frozen coordinate snapshot of a relationship target
//! - `OrderBy` - Result ordering
//!
//! Relationship filters capture the target's structure coordinates at call
//! time, so a criteria value stays valid even if the target element moves
//! afterwards. Criteria are plain values: cloning one never shares state with
//! the element that produced it.
//!
//! # Examples
//!
//! ```rust
//! use trellis_core::models::{Element, ElementCriteria, OrderBy};
//!
//! let section = Element::new("entry".to_string())
//!     .with_id("home".to_string())
//!     .with_structure(1, 1, 10, 1);
//!
//! // All enabled descendants of `section`, two levels down, newest first
//! let criteria = ElementCriteria::new("entry".to_string())
//!     .descendant_of(&section)
//!     .descendant_dist(2)
//!     .with_order_by(OrderBy::CreatedDesc)
//!     .with_limit(20);
//!
//! assert_eq!(criteria.descendant_dist, Some(2));
//! ```

use serde::{Deserialize, Serialize};

use crate::models::element::{Element, ElementStatus};
use crate::store::ElementSource;

/// Frozen structure coordinates of a relationship target
///
/// Captured when a relationship filter is applied, so the criteria does not
/// borrow or alias the target element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureRef {
    /// Id of the target element, when assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tree the target belongs to
    pub root: Option<i64>,

    /// Left interval bound
    pub lft: Option<i64>,

    /// Right interval bound
    pub rgt: Option<i64>,

    /// Depth, starting at 1
    pub level: Option<i64>,
}

impl From<&Element> for StructureRef {
    fn from(element: &Element) -> Self {
        Self {
            id: element.id.clone(),
            root: element.root,
            lft: element.lft,
            rgt: element.rgt,
            level: element.level,
        }
    }
}

/// Sort order for query results
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderBy {
    /// Tree order: root ascending, then lft ascending
    #[default]
    Structure,
    /// Sort by creation time, oldest first
    CreatedAsc,
    /// Sort by creation time, newest first
    CreatedDesc,
    /// Sort by slug alphabetically, A-Z
    SlugAsc,
    /// Sort by slug reverse alphabetically
    SlugDesc,
}

/// Declarative element query
///
/// A criteria starts from the defaults real listings want (enabled elements
/// whose locale row is enabled) and narrows from there. Passing `None` to
/// `with_status` or `with_locale_enabled` clears those filters explicitly.
///
/// Execution is delegated to an `ElementSource`; the criteria itself never
/// touches storage.
///
/// # Examples
///
/// ```rust
/// use trellis_core::models::{ElementCriteria, ElementStatus};
///
/// // Disabled entries in the German locale
/// let criteria = ElementCriteria::new("entry".to_string())
///     .with_locale("de".to_string())
///     .with_status(Some(ElementStatus::Disabled));
///
/// // Everything, regardless of status
/// let unfiltered = ElementCriteria::new("entry".to_string())
///     .with_status(None)
///     .with_locale_enabled(None);
///
/// assert_eq!(unfiltered.status, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementCriteria {
    /// Element type to query
    pub element_type: String,

    /// Filter by element id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Filter by locale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Filter by derived status (`None` disables status filtering)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ElementStatus>,

    /// Filter by the locale-enabled flag (`None` disables the filter)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale_enabled: Option<bool>,

    /// Match ancestors of this target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor_of: Option<StructureRef>,

    /// Exact number of levels above the `ancestor_of` target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor_dist: Option<i64>,

    /// Match descendants of this target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendant_of: Option<StructureRef>,

    /// Exact number of levels below the `descendant_of` target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendant_dist: Option<i64>,

    /// Match siblings of this target (the target itself is excluded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_of: Option<StructureRef>,

    /// Match the element immediately before this target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_sibling_of: Option<StructureRef>,

    /// Match the element immediately after this target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sibling_of: Option<StructureRef>,

    /// Result ordering
    #[serde(default)]
    pub order_by: OrderBy,

    /// Limit number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Skip this many results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl ElementCriteria {
    /// Create a criteria with default filters for an element type
    ///
    /// Defaults: enabled status, locale row enabled, structure order.
    pub fn new(element_type: String) -> Self {
        Self {
            element_type,
            id: None,
            locale: None,
            status: Some(ElementStatus::Enabled),
            locale_enabled: Some(true),
            ancestor_of: None,
            ancestor_dist: None,
            descendant_of: None,
            descendant_dist: None,
            sibling_of: None,
            prev_sibling_of: None,
            next_sibling_of: None,
            order_by: OrderBy::Structure,
            limit: None,
            offset: None,
        }
    }

    /// Filter by element id
    pub fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    /// Filter by locale
    pub fn with_locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Filter by derived status, or clear the filter with `None`
    pub fn with_status(mut self, status: Option<ElementStatus>) -> Self {
        self.status = status;
        self
    }

    /// Filter by the locale-enabled flag, or clear the filter with `None`
    pub fn with_locale_enabled(mut self, locale_enabled: Option<bool>) -> Self {
        self.locale_enabled = locale_enabled;
        self
    }

    /// Match ancestors of `target`
    pub fn ancestor_of(mut self, target: &Element) -> Self {
        self.ancestor_of = Some(StructureRef::from(target));
        self
    }

    /// Require ancestors exactly `dist` levels above the target
    pub fn ancestor_dist(mut self, dist: i64) -> Self {
        self.ancestor_dist = Some(dist);
        self
    }

    /// Match descendants of `target`
    pub fn descendant_of(mut self, target: &Element) -> Self {
        self.descendant_of = Some(StructureRef::from(target));
        self
    }

    /// Require descendants exactly `dist` levels below the target
    pub fn descendant_dist(mut self, dist: i64) -> Self {
        self.descendant_dist = Some(dist);
        self
    }

    /// Match siblings of `target`
    pub fn sibling_of(mut self, target: &Element) -> Self {
        self.sibling_of = Some(StructureRef::from(target));
        self
    }

    /// Match the element immediately before `target`
    pub fn prev_sibling_of(mut self, target: &Element) -> Self {
        self.prev_sibling_of = Some(StructureRef::from(target));
        self
    }

    /// Match the element immediately after `target`
    pub fn next_sibling_of(mut self, target: &Element) -> Self {
        self.next_sibling_of = Some(StructureRef::from(target));
        self
    }

    /// Set result ordering
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Limit number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` results
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Run the query and return all matches in criteria order
    pub async fn find(&self, source: &dyn ElementSource) -> anyhow::Result<Vec<Element>> {
        source.find(self).await
    }

    /// Run the query and return the first match, if any
    pub async fn first(&self, source: &dyn ElementSource) -> anyhow::Result<Option<Element>> {
        source.first(self).await
    }

    /// Run the query and return matching ids in criteria order
    pub async fn ids(&self, source: &dyn ElementSource) -> anyhow::Result<Vec<String>> {
        source.ids(self).await
    }
}
