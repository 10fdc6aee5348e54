//! Element Data Structures
//!
//! This module defines the core `Element` struct: a typed content entity with
//! identity, publication state, locale, and a position in a nested-set tree.
//!
//! # Architecture
//!
//! - **Structure coordinates**: `root`/`lft`/`rgt`/`level` encode the tree; an
//!   ancestor's interval strictly contains its descendants' intervals
//! - **Lazy relationships**: parent, siblings and relative elements resolve
//!   through an `ElementSource` once and are memoized on the element
//! - **Detached criteria**: relationship accessors hand out owned criteria
//!   values, never references into the element
//! - **Dynamic attributes**: unknown names resolve against the built-in
//!   attribute set first, then against registered field handles
//!
//! Elements never persist themselves and never recompute tree coordinates;
//! both belong to the storage side of the collaborator boundary.
//!
//! # Examples
//!
//! ```rust
//! use trellis_core::models::{Element, ElementStatus};
//!
//! let element = Element::new("entry".to_string())
//!     .with_slug("welcome".to_string())
//!     .with_structure(1, 2, 5, 2);
//!
//! assert_eq!(element.status(), ElementStatus::Enabled);
//! assert_eq!(element.total_descendants(), 1);
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ElementError;
use crate::models::content::{Content, PostedContent};
use crate::models::criteria::ElementCriteria;
use crate::models::field::{Field, DEFAULT_FIELD_CONTEXT};
use crate::models::memo::Memo;
use crate::store::{ContentStore, ElementSource, FieldRegistry};

/// Default for boolean flags that start enabled
fn default_true() -> bool {
    true
}

fn default_field_context() -> String {
    DEFAULT_FIELD_CONTEXT.to_string()
}

/// Validation errors for Element state
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Element id cannot be empty")]
    EmptyId,

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Structure bounds must be set together")]
    UnpairedBounds,

    #[error("Structure bounds are inverted: lft {lft} must be less than rgt {rgt}")]
    InvertedBounds { lft: i64, rgt: i64 },

    #[error("Structure interval width must be odd: lft {lft}, rgt {rgt}")]
    EvenInterval { lft: i64, rgt: i64 },

    #[error("Structure level must be at least 1: {0}")]
    InvalidLevel(i64),
}

/// Derived publication status of an element
///
/// Never stored: always computed from the `archived`, `enabled` and
/// `locale_enabled` flags, in that precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementStatus {
    /// Live: enabled both globally and for the current locale
    Enabled,
    /// Hidden: disabled globally or for the current locale
    Disabled,
    /// Soft-deleted
    Archived,
}

impl ElementStatus {
    /// Status name as used in criteria payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementStatus::Enabled => "enabled",
            ElementStatus::Disabled => "disabled",
            ElementStatus::Archived => "archived",
        }
    }
}

/// Content entity with structure coordinates and lazy relationships
///
/// # Fields
///
/// - `id`: Unique identifier; immutable once assigned
/// - `element_type`: Type tag (e.g., "entry", "category", "asset")
/// - `enabled` / `archived` / `locale_enabled`: Publication flags feeding the
///   derived [`status`](Element::status)
/// - `locale`: Locale this instance carries content for
/// - `slug` / `uri`: Addressing attributes
/// - `field_context`: Context used when resolving field handles
/// - `root` / `lft` / `rgt` / `level`: Nested-set coordinates; all `None` for
///   elements outside any structure
///
/// Relationship lookups (`parent`, `prev_sibling`, ...) run at most once per
/// element and memoize their outcome, including "nothing found". Criteria
/// accessors (`ancestors`, `children`, ...) build their base criteria once
/// and return an independent clone on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier; immutable once assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Element type tag (e.g., "entry", "category")
    pub element_type: String,

    /// Whether the element is enabled globally
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether the element is soft-deleted
    #[serde(default)]
    pub archived: bool,

    /// Locale this element instance carries content for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Whether the element is enabled for its locale
    #[serde(default = "default_true")]
    pub locale_enabled: bool,

    /// URL slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Resolved URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,

    /// Last modification timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,

    /// Context used when resolving field handles
    #[serde(default = "default_field_context")]
    pub field_context: String,

    /// Tree this element belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<i64>,

    /// Left nested-set bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lft: Option<i64>,

    /// Right nested-set bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgt: Option<i64>,

    /// Depth in the tree, starting at 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,

    // Lazily resolved relationships. Never serialized; a hydrated element
    // starts with everything unresolved.
    #[serde(skip)]
    parent: Memo<Box<Element>>,

    #[serde(skip)]
    prev_element: Memo<Box<Element>>,

    #[serde(skip)]
    next_element: Memo<Box<Element>>,

    #[serde(skip)]
    prev_sibling: Memo<Box<Element>>,

    #[serde(skip)]
    next_sibling: Memo<Box<Element>>,

    #[serde(skip)]
    ancestors_criteria: Option<ElementCriteria>,

    #[serde(skip)]
    descendants_criteria: Option<ElementCriteria>,

    #[serde(skip)]
    children_criteria: Option<ElementCriteria>,

    #[serde(skip)]
    siblings_criteria: Option<ElementCriteria>,

    #[serde(skip)]
    content: Option<Content>,

    #[serde(skip)]
    raw_post_content: Map<String, Value>,

    #[serde(skip)]
    prepped_content: HashMap<String, Value>,

    #[serde(skip)]
    fields_by_handle: HashMap<String, Option<Field>>,

    #[serde(skip)]
    content_post_location: Option<String>,
}

impl Element {
    /// Create a new element of the given type
    ///
    /// Starts enabled, unarchived, outside any structure, with the default
    /// field context.
    pub fn new(element_type: String) -> Self {
        Self {
            id: None,
            element_type,
            enabled: true,
            archived: false,
            locale: None,
            locale_enabled: true,
            slug: None,
            uri: None,
            date_created: None,
            date_updated: None,
            field_context: default_field_context(),
            root: None,
            lft: None,
            rgt: None,
            level: None,
            parent: Memo::Unresolved,
            prev_element: Memo::Unresolved,
            next_element: Memo::Unresolved,
            prev_sibling: Memo::Unresolved,
            next_sibling: Memo::Unresolved,
            ancestors_criteria: None,
            descendants_criteria: None,
            children_criteria: None,
            siblings_criteria: None,
            content: None,
            raw_post_content: Map::new(),
            prepped_content: HashMap::new(),
            fields_by_handle: HashMap::new(),
            content_post_location: None,
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the locale
    pub fn with_locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Set the slug
    pub fn with_slug(mut self, slug: String) -> Self {
        self.slug = Some(slug);
        self
    }

    /// Set the URI
    pub fn with_uri(mut self, uri: String) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the archived flag
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    /// Set the locale-enabled flag
    pub fn with_locale_enabled(mut self, locale_enabled: bool) -> Self {
        self.locale_enabled = locale_enabled;
        self
    }

    /// Set the field context
    pub fn with_field_context(mut self, field_context: String) -> Self {
        self.field_context = field_context;
        self
    }

    /// Set all four structure coordinates
    pub fn with_structure(mut self, root: i64, lft: i64, rgt: i64, level: i64) -> Self {
        self.root = Some(root);
        self.lft = Some(lft);
        self.rgt = Some(rgt);
        self.level = Some(level);
        self
    }

    //
    // STATUS
    //

    /// Derived publication status
    ///
    /// Archived wins over everything; a disabled element or locale row wins
    /// over enabled.
    pub fn status(&self) -> ElementStatus {
        if self.archived {
            ElementStatus::Archived
        } else if !self.enabled || !self.locale_enabled {
            ElementStatus::Disabled
        } else {
            ElementStatus::Enabled
        }
    }

    //
    // STRUCTURE PREDICATES
    //
    // Pure coordinate math; no lookups. Elements with unset or pathological
    // coordinates fail every predicate rather than erroring, so the
    // arithmetic on neighboring bounds is checked.

    /// True when this element's interval strictly contains `other`'s
    pub fn is_ancestor_of(&self, other: &Element) -> bool {
        match (self.lft, self.rgt, other.lft, other.rgt) {
            (Some(lft), Some(rgt), Some(other_lft), Some(other_rgt)) => {
                self.root == other.root && lft < other_lft && rgt > other_rgt
            }
            _ => false,
        }
    }

    /// True when `other`'s interval strictly contains this element's
    pub fn is_descendant_of(&self, other: &Element) -> bool {
        other.is_ancestor_of(self)
    }

    /// True when this element is `other`'s immediate ancestor
    pub fn is_parent_of(&self, other: &Element) -> bool {
        match (self.level, other.level) {
            (Some(level), Some(other_level)) => {
                other_level.checked_sub(1) == Some(level) && self.is_ancestor_of(other)
            }
            _ => false,
        }
    }

    /// True when `other` is this element's immediate ancestor
    pub fn is_child_of(&self, other: &Element) -> bool {
        other.is_parent_of(self)
    }

    /// True when both elements share a parent
    ///
    /// All level-1 elements of a tree are mutual siblings. Deeper levels are
    /// confirmed by adjacency or, when non-adjacent, by testing against
    /// whichever side has its parent memoized, so the answer does not depend
    /// on the argument order. When neither parent was ever resolved the
    /// predicate cannot confirm siblinghood (the `sibling_of` criteria
    /// filter can).
    ///
    /// `other` being this element itself is not special-cased; sibling
    /// queries exclude the target by id instead.
    pub fn is_sibling_of(&self, other: &Element) -> bool {
        if self.root != other.root {
            return false;
        }
        match (self.level, other.level) {
            (Some(level), Some(other_level)) if level == other_level => {
                if level == 1 || self.is_prev_sibling_of(other) || self.is_next_sibling_of(other)
                {
                    return true;
                }
                match (self.parent.value(), other.parent.value()) {
                    (Some(parent), _) => other.is_descendant_of(parent),
                    (None, Some(parent)) => self.is_descendant_of(parent),
                    (None, None) => false,
                }
            }
            _ => false,
        }
    }

    /// True when this element sits immediately before `other` under the same
    /// parent
    pub fn is_prev_sibling_of(&self, other: &Element) -> bool {
        match (self.rgt, other.lft) {
            (Some(rgt), Some(other_lft)) => {
                self.root == other.root
                    && self.level == other.level
                    && other_lft.checked_sub(1) == Some(rgt)
            }
            _ => false,
        }
    }

    /// True when this element sits immediately after `other` under the same
    /// parent
    pub fn is_next_sibling_of(&self, other: &Element) -> bool {
        other.is_prev_sibling_of(self)
    }

    /// True when the interval is wide enough to hold descendants
    pub fn has_descendants(&self) -> bool {
        match (self.lft, self.rgt) {
            (Some(lft), Some(rgt)) => lft.checked_add(1).is_some_and(|leaf_rgt| rgt > leaf_rgt),
            _ => false,
        }
    }

    /// Number of descendants encoded by the interval width
    pub fn total_descendants(&self) -> i64 {
        match (self.lft, self.rgt) {
            (Some(lft), Some(rgt)) if rgt > lft => {
                rgt.checked_sub(lft).map_or(0, |width| (width - 1) / 2)
            }
            _ => 0,
        }
    }

    //
    // RELATIONSHIP ACCESSORS
    //

    /// Immediate parent, resolved once and memoized
    ///
    /// The lookup clears the default status and locale-enabled filters, so a
    /// disabled parent is still found.
    pub async fn parent(
        &mut self,
        source: &dyn ElementSource,
    ) -> Result<Option<&Element>, ElementError> {
        if !self.parent.is_resolved() {
            let criteria = self
                .ancestors_base()
                .ancestor_dist(1)
                .with_status(None)
                .with_locale_enabled(None);
            let found = criteria.first(source).await?;
            self.parent.set(found.map(Box::new));
        }
        Ok(self.parent.value().map(|boxed| &**boxed))
    }

    /// Override the memoized parent and recompute `level`
    ///
    /// `None` marks the element as top-level (level 1). Interval bounds are
    /// left untouched; rebalancing them is the storage side's job.
    pub fn set_parent(&mut self, parent: Option<Element>) {
        match parent {
            Some(parent) => {
                self.level = Some(parent.level.unwrap_or(0).saturating_add(1));
                self.parent.set(Some(Box::new(parent)));
            }
            None => {
                self.level = Some(1);
                self.parent.set(None);
            }
        }
    }

    /// Criteria matching this element's ancestors
    ///
    /// With `dist`, only ancestors exactly `dist` levels up match. Every call
    /// returns an independent criteria value; the shared base is built once.
    pub fn ancestors(&mut self, dist: Option<i64>) -> ElementCriteria {
        let criteria = self.ancestors_base();
        match dist {
            Some(dist) => criteria.ancestor_dist(dist),
            None => criteria,
        }
    }

    /// Criteria matching this element's descendants
    ///
    /// With `dist`, only descendants exactly `dist` levels down match.
    pub fn descendants(&mut self, dist: Option<i64>) -> ElementCriteria {
        let criteria = self.descendants_base();
        match dist {
            Some(dist) => criteria.descendant_dist(dist),
            None => criteria,
        }
    }

    /// Criteria matching this element's direct children
    ///
    /// Derived from `descendants` at distance 1 the first time, then cached
    /// on its own.
    pub fn children(&mut self) -> ElementCriteria {
        if let Some(criteria) = &self.children_criteria {
            return criteria.clone();
        }
        let criteria = self.descendants(Some(1));
        self.children_criteria = Some(criteria.clone());
        criteria
    }

    /// Criteria matching this element's siblings
    pub fn siblings(&mut self) -> ElementCriteria {
        if let Some(criteria) = &self.siblings_criteria {
            return criteria.clone();
        }
        let mut criteria = ElementCriteria::new(self.element_type.clone()).sibling_of(self);
        if let Some(locale) = self.locale.clone() {
            criteria = criteria.with_locale(locale);
        }
        self.siblings_criteria = Some(criteria.clone());
        criteria
    }

    /// Sibling immediately before this element, resolved once and memoized
    ///
    /// The adjacency lookup clears the status and locale-enabled filters but
    /// stays scoped to this element's locale.
    pub async fn prev_sibling(
        &mut self,
        source: &dyn ElementSource,
    ) -> Result<Option<&Element>, ElementError> {
        if !self.prev_sibling.is_resolved() {
            let mut criteria = ElementCriteria::new(self.element_type.clone())
                .prev_sibling_of(self)
                .with_status(None)
                .with_locale_enabled(None);
            if let Some(locale) = self.locale.clone() {
                criteria = criteria.with_locale(locale);
            }
            let found = criteria.first(source).await?;
            self.prev_sibling.set(found.map(Box::new));
        }
        Ok(self.prev_sibling.value().map(|boxed| &**boxed))
    }

    /// Sibling immediately after this element, resolved once and memoized
    pub async fn next_sibling(
        &mut self,
        source: &dyn ElementSource,
    ) -> Result<Option<&Element>, ElementError> {
        if !self.next_sibling.is_resolved() {
            let mut criteria = ElementCriteria::new(self.element_type.clone())
                .next_sibling_of(self)
                .with_status(None)
                .with_locale_enabled(None);
            if let Some(locale) = self.locale.clone() {
                criteria = criteria.with_locale(locale);
            }
            let found = criteria.first(source).await?;
            self.next_sibling.set(found.map(Box::new));
        }
        Ok(self.next_sibling.value().map(|boxed| &**boxed))
    }

    /// Element after this one in `criteria` order
    ///
    /// A supplied criteria scopes the whole walk, the neighbor fetch
    /// included. With no criteria, the memoized value set by
    /// [`set_next`](Element::set_next) is returned when present; otherwise
    /// the walk runs against a default criteria for this element's type and
    /// locale. Computed results are never memoized, so repeated calls
    /// observe current data.
    pub async fn next(
        &mut self,
        criteria: Option<ElementCriteria>,
        source: &dyn ElementSource,
    ) -> Result<Option<Element>, ElementError> {
        match criteria {
            Some(criteria) => self.relative_element(criteria, 1, source).await,
            None => {
                if self.next_element.is_resolved() {
                    return Ok(self.next_element.value().map(|boxed| (**boxed).clone()));
                }
                let criteria = self.default_criteria();
                self.relative_element(criteria, 1, source).await
            }
        }
    }

    /// Element before this one in `criteria` order
    ///
    /// Mirror of [`next`](Element::next).
    pub async fn prev(
        &mut self,
        criteria: Option<ElementCriteria>,
        source: &dyn ElementSource,
    ) -> Result<Option<Element>, ElementError> {
        match criteria {
            Some(criteria) => self.relative_element(criteria, -1, source).await,
            None => {
                if self.prev_element.is_resolved() {
                    return Ok(self.prev_element.value().map(|boxed| (**boxed).clone()));
                }
                let criteria = self.default_criteria();
                self.relative_element(criteria, -1, source).await
            }
        }
    }

    /// Memoize the default next element
    pub fn set_next(&mut self, next: Option<Element>) {
        self.next_element.set(next.map(Box::new));
    }

    /// Memoize the default previous element
    pub fn set_prev(&mut self, prev: Option<Element>) {
        self.prev_element.set(prev.map(Box::new));
    }

    /// Walk `criteria` order relative to this element
    ///
    /// Finds this element's position in the ordered id list, steps by `dir`,
    /// and resolves the neighboring id under the same filters with only the
    /// id overridden. The criteria is owned here, so the override never
    /// reaches a caller's copy.
    async fn relative_element(
        &self,
        criteria: ElementCriteria,
        dir: i64,
        source: &dyn ElementSource,
    ) -> Result<Option<Element>, ElementError> {
        let Some(id) = self.id.as_deref() else {
            return Ok(None);
        };
        let ids = criteria.ids(source).await?;
        let Some(position) = ids.iter().position(|other| other.as_str() == id) else {
            return Ok(None);
        };
        let target = position as i64 + dir;
        if target < 0 || target as usize >= ids.len() {
            return Ok(None);
        }
        let fresh = criteria.with_id(ids[target as usize].clone());
        Ok(fresh.first(source).await?)
    }

    fn ancestors_base(&mut self) -> ElementCriteria {
        if let Some(criteria) = &self.ancestors_criteria {
            return criteria.clone();
        }
        let mut criteria = ElementCriteria::new(self.element_type.clone()).ancestor_of(self);
        if let Some(locale) = self.locale.clone() {
            criteria = criteria.with_locale(locale);
        }
        self.ancestors_criteria = Some(criteria.clone());
        criteria
    }

    fn descendants_base(&mut self) -> ElementCriteria {
        if let Some(criteria) = &self.descendants_criteria {
            return criteria.clone();
        }
        let mut criteria = ElementCriteria::new(self.element_type.clone()).descendant_of(self);
        if let Some(locale) = self.locale.clone() {
            criteria = criteria.with_locale(locale);
        }
        self.descendants_criteria = Some(criteria.clone());
        criteria
    }

    fn default_criteria(&self) -> ElementCriteria {
        let mut criteria = ElementCriteria::new(self.element_type.clone());
        if let Some(locale) = self.locale.clone() {
            criteria = criteria.with_locale(locale);
        }
        criteria
    }

    //
    // DYNAMIC ATTRIBUTES
    //

    /// Read an attribute by name
    ///
    /// Built-in attributes (including the derived `status` and the content
    /// `title`) are checked first; any other name is treated as a field
    /// handle in this element's context and resolves to the prepped field
    /// value. Unknown names fail with
    /// [`ElementError::UnknownAttribute`].
    pub async fn attribute(
        &mut self,
        name: &str,
        fields: &dyn FieldRegistry,
        content_store: &dyn ContentStore,
    ) -> Result<Value, ElementError> {
        if let Some(value) = self.builtin_attribute(name) {
            return Ok(value);
        }
        if name == "title" {
            return Ok(match self.title(content_store).await? {
                Some(title) => Value::String(title),
                None => Value::Null,
            });
        }
        if self.field_by_handle(name, fields).await?.is_some() {
            return self.field_value(name, fields, content_store).await;
        }
        Err(ElementError::unknown_attribute(name))
    }

    /// Check whether a name resolves to an attribute or field handle
    pub async fn has_attribute(
        &mut self,
        name: &str,
        fields: &dyn FieldRegistry,
    ) -> Result<bool, ElementError> {
        if name == "title" || self.builtin_attribute(name).is_some() {
            return Ok(true);
        }
        Ok(self.field_by_handle(name, fields).await?.is_some())
    }

    /// Write a built-in attribute by name
    ///
    /// Derived and immutable names (`status`, `title`, `total_descendants`,
    /// an already-assigned `id`) are rejected as read-only; names outside
    /// the built-in set fail with [`ElementError::UnknownAttribute`]. Field
    /// values are written through the content operations instead.
    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), ElementError> {
        match name {
            "id" => {
                if self.id.is_some() {
                    return Err(ElementError::read_only_attribute(name));
                }
                self.id = coerce_opt_string(name, value)?;
            }
            "element_type" => self.element_type = coerce_string(name, value)?,
            "enabled" => self.enabled = coerce_bool(name, value)?,
            "archived" => self.archived = coerce_bool(name, value)?,
            "locale" => self.locale = coerce_opt_string(name, value)?,
            "locale_enabled" => self.locale_enabled = coerce_bool(name, value)?,
            "slug" => self.slug = coerce_opt_string(name, value)?,
            "uri" => self.uri = coerce_opt_string(name, value)?,
            "field_context" => self.field_context = coerce_string(name, value)?,
            "root" => self.root = coerce_opt_i64(name, value)?,
            "lft" => self.lft = coerce_opt_i64(name, value)?,
            "rgt" => self.rgt = coerce_opt_i64(name, value)?,
            "level" => self.level = coerce_opt_i64(name, value)?,
            "date_created" => self.date_created = coerce_opt_datetime(name, value)?,
            "date_updated" => self.date_updated = coerce_opt_datetime(name, value)?,
            "status" | "title" | "total_descendants" => {
                return Err(ElementError::read_only_attribute(name));
            }
            _ => return Err(ElementError::unknown_attribute(name)),
        }
        Ok(())
    }

    fn builtin_attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => opt_string_value(&self.id),
            "element_type" => Value::String(self.element_type.clone()),
            "enabled" => Value::Bool(self.enabled),
            "archived" => Value::Bool(self.archived),
            "locale" => opt_string_value(&self.locale),
            "locale_enabled" => Value::Bool(self.locale_enabled),
            "slug" => opt_string_value(&self.slug),
            "uri" => opt_string_value(&self.uri),
            "date_created" => opt_datetime_value(&self.date_created),
            "date_updated" => opt_datetime_value(&self.date_updated),
            "field_context" => Value::String(self.field_context.clone()),
            "root" => opt_i64_value(self.root),
            "lft" => opt_i64_value(self.lft),
            "rgt" => opt_i64_value(self.rgt),
            "level" => opt_i64_value(self.level),
            "status" => Value::String(self.status().as_str().to_string()),
            _ => return None,
        };
        Some(value)
    }

    //
    // CONTENT AND FIELDS
    //

    /// Content for this element and locale, loaded or created once
    ///
    /// Asks the store for an existing row first and falls back to creating a
    /// blank one; either way the result is memoized and the store is never
    /// asked twice.
    pub async fn content(
        &mut self,
        store: &dyn ContentStore,
    ) -> Result<&mut Content, ElementError> {
        if self.content.is_none() {
            let loaded = match store.get_content(self).await? {
                Some(content) => content,
                None => store.create_content(self).await?,
            };
            self.content = Some(loaded);
        }
        Ok(self.content.get_or_insert_with(Content::new))
    }

    /// Replace the memoized content outright
    pub fn set_content(&mut self, content: Content) {
        self.content = Some(content);
    }

    /// Merge values into the content, creating a blank row first if needed
    ///
    /// A `title` key lands on the content title; everything else is treated
    /// as a field value.
    pub async fn set_content_values(
        &mut self,
        values: Map<String, Value>,
        store: &dyn ContentStore,
    ) -> Result<(), ElementError> {
        let content = self.content(store).await?;
        for (handle, value) in values {
            if handle == "title" {
                content.title = value.as_str().map(|title| title.to_string());
            } else {
                content.fields.insert(handle, value);
            }
        }
        Ok(())
    }

    /// Element title from content
    pub async fn title(
        &mut self,
        store: &dyn ContentStore,
    ) -> Result<Option<String>, ElementError> {
        Ok(self.content(store).await?.title.clone())
    }

    /// Accept posted values, walking the field layout in order
    ///
    /// For every layout field: a submitted value is captured raw and then
    /// prepared through the field type's post hook; a missing value with an
    /// upload at `location.handle` becomes null (nothing captured raw); a
    /// field with neither is skipped entirely. Prepared values land on the
    /// content object.
    pub async fn set_content_from_post(
        &mut self,
        post: PostedContent,
        fields: &dyn FieldRegistry,
        store: &dyn ContentStore,
    ) -> Result<(), ElementError> {
        if let Some(location) = &post.location {
            self.content_post_location = Some(location.clone());
        }
        let Some(layout) = fields.layout(&self.element_type).await? else {
            return Ok(());
        };

        let mut prepared: Vec<(String, Value)> = Vec::new();
        for field in &layout.fields {
            let handle = &field.handle;
            let value = if let Some(value) = post.values.get(handle) {
                self.raw_post_content
                    .insert(handle.clone(), value.clone());
                value.clone()
            } else if let Some(location) = &post.location {
                let upload_name = format!("{location}.{handle}");
                if post.files.contains(&upload_name) {
                    Value::Null
                } else {
                    continue;
                }
            } else {
                continue;
            };

            let value = match fields.field_type(&field.kind) {
                Some(field_type) => field_type.prep_value_from_post(value, self),
                None => {
                    tracing::debug!(
                        "no field type registered for kind '{}', leaving '{}' as posted",
                        field.kind,
                        handle
                    );
                    value
                }
            };
            prepared.push((handle.clone(), value));
        }

        let content = self.content(store).await?;
        for (handle, value) in prepared {
            content.fields.insert(handle, value);
        }
        Ok(())
    }

    /// Raw submitted values captured by the last
    /// [`set_content_from_post`](Element::set_content_from_post)
    ///
    /// Only fields that actually submitted a value appear here; upload-only
    /// and skipped fields leave no key behind.
    pub fn raw_post_content(&self) -> &Map<String, Value> {
        &self.raw_post_content
    }

    /// Namespace the last post was submitted under
    pub fn content_post_location(&self) -> Option<&str> {
        self.content_post_location.as_deref()
    }

    /// Record the namespace future posts will be submitted under
    pub fn set_content_post_location(&mut self, location: String) {
        self.content_post_location = Some(location);
    }

    /// Field definition for a handle in this element's context
    ///
    /// Registry answers are cached per handle, including "no such field", so
    /// repeated lookups never go back to the registry.
    pub async fn field_by_handle(
        &mut self,
        handle: &str,
        fields: &dyn FieldRegistry,
    ) -> Result<Option<&Field>, ElementError> {
        if !self.fields_by_handle.contains_key(handle) {
            let found = fields.field_by_handle(handle, &self.field_context).await?;
            if found.is_none() {
                tracing::debug!(
                    "no field with handle '{}' in context '{}'",
                    handle,
                    self.field_context
                );
            }
            self.fields_by_handle.insert(handle.to_string(), found);
        }
        Ok(self
            .fields_by_handle
            .get(handle)
            .and_then(|cached| cached.as_ref()))
    }

    /// Prepped value of a custom field
    ///
    /// The raw content value (null when the content has no value for the
    /// handle) is passed through the field type's prep hook and memoized,
    /// null results included. An unknown handle fails with
    /// [`ElementError::FieldNotFound`] and leaves the memo untouched.
    pub async fn field_value(
        &mut self,
        handle: &str,
        fields: &dyn FieldRegistry,
        store: &dyn ContentStore,
    ) -> Result<Value, ElementError> {
        if let Some(cached) = self.prepped_content.get(handle) {
            return Ok(cached.clone());
        }

        let Some(field) = self.field_by_handle(handle, fields).await? else {
            return Err(ElementError::field_not_found(handle));
        };
        let kind = field.kind.clone();

        let raw = self
            .content(store)
            .await?
            .field_value(handle)
            .cloned()
            .unwrap_or(Value::Null);

        let prepped = match fields.field_type(&kind) {
            Some(field_type) => field_type.prep_value(raw, self),
            None => raw,
        };
        self.prepped_content
            .insert(handle.to_string(), prepped.clone());
        Ok(prepped)
    }

    //
    // VALIDATION
    //

    /// Validate element state
    ///
    /// Checks id and slug shape plus structure coordinate coherence. A
    /// well-formed interval spans an odd width: a leaf occupies two slots
    /// and every descendant adds two more.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(ValidationError::EmptyId);
            }
        }
        if let Some(slug) = &self.slug {
            if !slug_pattern().is_match(slug) {
                return Err(ValidationError::InvalidSlug(slug.clone()));
            }
        }
        match (self.lft, self.rgt) {
            (Some(lft), Some(rgt)) => {
                if lft >= rgt {
                    return Err(ValidationError::InvertedBounds { lft, rgt });
                }
                // Widened so extreme bounds report instead of overflowing
                if (rgt as i128 - lft as i128) % 2 == 0 {
                    return Err(ValidationError::EvenInterval { lft, rgt });
                }
            }
            (None, None) => {}
            _ => return Err(ValidationError::UnpairedBounds),
        }
        if let Some(level) = self.level {
            if level < 1 {
                return Err(ValidationError::InvalidLevel(level));
            }
        }
        Ok(())
    }
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("slug pattern is valid"))
}

fn opt_string_value(value: &Option<String>) -> Value {
    match value {
        Some(value) => Value::String(value.clone()),
        None => Value::Null,
    }
}

fn opt_i64_value(value: Option<i64>) -> Value {
    match value {
        Some(value) => Value::from(value),
        None => Value::Null,
    }
}

fn opt_datetime_value(value: &Option<DateTime<Utc>>) -> Value {
    match value {
        Some(value) => Value::String(value.to_rfc3339()),
        None => Value::Null,
    }
}

fn coerce_bool(name: &str, value: Value) -> Result<bool, ElementError> {
    value
        .as_bool()
        .ok_or_else(|| ElementError::invalid_attribute_value(name))
}

fn coerce_string(name: &str, value: Value) -> Result<String, ElementError> {
    match value {
        Value::String(value) => Ok(value),
        _ => Err(ElementError::invalid_attribute_value(name)),
    }
}

fn coerce_opt_string(name: &str, value: Value) -> Result<Option<String>, ElementError> {
    match value {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value)),
        _ => Err(ElementError::invalid_attribute_value(name)),
    }
}

fn coerce_opt_i64(name: &str, value: Value) -> Result<Option<i64>, ElementError> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_i64()
            .map(Some)
            .ok_or_else(|| ElementError::invalid_attribute_value(name)),
    }
}

fn coerce_opt_datetime(name: &str, value: Value) -> Result<Option<DateTime<Utc>>, ElementError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| ElementError::invalid_attribute_value(name)),
        _ => Err(ElementError::invalid_attribute_value(name)),
    }
}
