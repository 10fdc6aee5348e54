//! In-Memory Backend
//!
//! This module implements all three collaborator traits over plain in-memory
//! tables. It is the reference backend used by tests and benches: criteria
//! evaluation is a linear scan applying the nested-set interval math that a
//! database backend would push into SQL.
//!
//! Structure coordinates are taken exactly as seeded and never rebalanced;
//! producing coherent `root`/`lft`/`rgt`/`level` values is the seeder's job.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::behaviors::{FieldType, FieldTypeRegistry};
use crate::models::{
    Content, Element, ElementCriteria, Field, FieldLayout, OrderBy, StructureRef,
};
use crate::store::{ContentStore, ElementSource, FieldRegistry};

/// In-memory implementation of `ElementSource`, `ContentStore` and
/// `FieldRegistry`
///
/// Elements, content rows and field definitions live in tables behind a
/// single lock; every query hands out detached clones.
pub struct MemoryStore {
    state: RwLock<State>,
    field_types: FieldTypeRegistry,
}

#[derive(Default)]
struct State {
    elements: Vec<Element>,
    contents: Vec<Content>,
    fields: Vec<Field>,
    layouts: HashMap<String, FieldLayout>,
}

impl MemoryStore {
    /// Create an empty store with the built-in field types
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            field_types: FieldTypeRegistry::with_defaults(),
        }
    }

    /// Create an empty store with a custom field-type registry
    pub fn with_field_types(field_types: FieldTypeRegistry) -> Self {
        Self {
            state: RwLock::new(State::default()),
            field_types,
        }
    }

    /// Add an element and return the stored snapshot
    ///
    /// Assigns a UUID when the element has no id and stamps missing
    /// timestamps.
    pub async fn add_element(&self, mut element: Element) -> Element {
        if element.id.is_none() {
            element.id = Some(Uuid::new_v4().to_string());
        }
        let now = Utc::now();
        if element.date_created.is_none() {
            element.date_created = Some(now);
        }
        if element.date_updated.is_none() {
            element.date_updated = Some(now);
        }
        let mut state = self.state.write().await;
        state.elements.push(element.clone());
        element
    }

    /// Replace a stored element by id
    ///
    /// Returns false when no element carries the id.
    pub async fn update_element(&self, element: Element) -> bool {
        if element.id.is_none() {
            return false;
        }
        let mut state = self.state.write().await;
        match state
            .elements
            .iter_mut()
            .find(|stored| stored.id == element.id)
        {
            Some(stored) => {
                *stored = element;
                true
            }
            None => false,
        }
    }

    /// Register a field definition
    pub async fn add_field(&self, field: Field) {
        let mut state = self.state.write().await;
        state.fields.push(field);
    }

    /// Attach a field layout to its element type
    pub async fn set_layout(&self, layout: FieldLayout) {
        let mut state = self.state.write().await;
        state.layouts.insert(layout.element_type.clone(), layout);
    }

    /// Add a content row
    pub async fn add_content(&self, content: Content) {
        let mut state = self.state.write().await;
        state.contents.push(content);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn matches(&self, criteria: &ElementCriteria, element: &Element) -> bool {
        if element.element_type != criteria.element_type {
            return false;
        }
        if let Some(id) = &criteria.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(locale) = &criteria.locale {
            if element.locale.as_deref() != Some(locale.as_str()) {
                return false;
            }
        }
        if let Some(status) = criteria.status {
            if element.status() != status {
                return false;
            }
        }
        if let Some(locale_enabled) = criteria.locale_enabled {
            if element.locale_enabled != locale_enabled {
                return false;
            }
        }
        if let Some(target) = &criteria.ancestor_of {
            if !ancestor_of_target(element, target, criteria.ancestor_dist) {
                return false;
            }
        }
        if let Some(target) = &criteria.descendant_of {
            if !descendant_of_target(element, target, criteria.descendant_dist) {
                return false;
            }
        }
        if let Some(target) = &criteria.sibling_of {
            if !self.sibling_of_target(element, target) {
                return false;
            }
        }
        if let Some(target) = &criteria.prev_sibling_of {
            if !prev_sibling_of_target(element, target) {
                return false;
            }
        }
        if let Some(target) = &criteria.next_sibling_of {
            if !next_sibling_of_target(element, target) {
                return false;
            }
        }
        true
    }

    /// Sibling test including the shared-parent fallback
    ///
    /// The target itself never matches. Level-1 elements of a tree are all
    /// siblings; deeper non-adjacent candidates must sit inside the target
    /// parent's interval, which takes a scan for that parent.
    fn sibling_of_target(&self, element: &Element, target: &StructureRef) -> bool {
        if element.root != target.root {
            return false;
        }
        let (Some(level), Some(target_level)) = (element.level, target.level) else {
            return false;
        };
        if level != target_level {
            return false;
        }
        if element.id.is_some() && element.id == target.id {
            return false;
        }
        if level == 1 {
            return true;
        }
        if prev_sibling_of_target(element, target) || next_sibling_of_target(element, target) {
            return true;
        }
        let Some(parent) = self.parent_of(target) else {
            return false;
        };
        let (Some(lft), Some(rgt), Some(parent_lft), Some(parent_rgt)) =
            (element.lft, element.rgt, parent.lft, parent.rgt)
        else {
            return false;
        };
        lft > parent_lft && rgt < parent_rgt
    }

    /// The element one level up whose interval contains the target's
    fn parent_of(&self, target: &StructureRef) -> Option<&Element> {
        let parent_level = target.level?.checked_sub(1)?;
        let target_lft = target.lft?;
        let target_rgt = target.rgt?;
        self.elements.iter().find(|candidate| {
            candidate.root == target.root
                && candidate.level == Some(parent_level)
                && candidate.lft.is_some_and(|lft| lft < target_lft)
                && candidate.rgt.is_some_and(|rgt| rgt > target_rgt)
        })
    }
}

fn ancestor_of_target(element: &Element, target: &StructureRef, dist: Option<i64>) -> bool {
    let (Some(lft), Some(rgt), Some(target_lft), Some(target_rgt)) =
        (element.lft, element.rgt, target.lft, target.rgt)
    else {
        return false;
    };
    if element.root != target.root || lft >= target_lft || rgt <= target_rgt {
        return false;
    }
    match (dist, element.level, target.level) {
        (None, _, _) => true,
        (Some(dist), Some(level), Some(target_level)) => {
            target_level.checked_sub(dist) == Some(level)
        }
        _ => false,
    }
}

fn descendant_of_target(element: &Element, target: &StructureRef, dist: Option<i64>) -> bool {
    let (Some(lft), Some(rgt), Some(target_lft), Some(target_rgt)) =
        (element.lft, element.rgt, target.lft, target.rgt)
    else {
        return false;
    };
    if element.root != target.root || lft <= target_lft || rgt >= target_rgt {
        return false;
    }
    match (dist, element.level, target.level) {
        (None, _, _) => true,
        (Some(dist), Some(level), Some(target_level)) => {
            target_level.checked_add(dist) == Some(level)
        }
        _ => false,
    }
}

fn prev_sibling_of_target(element: &Element, target: &StructureRef) -> bool {
    let (Some(rgt), Some(target_lft)) = (element.rgt, target.lft) else {
        return false;
    };
    element.root == target.root
        && element.level == target.level
        && target_lft.checked_sub(1) == Some(rgt)
}

fn next_sibling_of_target(element: &Element, target: &StructureRef) -> bool {
    let (Some(lft), Some(target_rgt)) = (element.lft, target.rgt) else {
        return false;
    };
    element.root == target.root
        && element.level == target.level
        && target_rgt.checked_add(1) == Some(lft)
}

fn compare(order_by: OrderBy, a: &Element, b: &Element) -> Ordering {
    let ordering = match order_by {
        OrderBy::Structure => a.root.cmp(&b.root).then(a.lft.cmp(&b.lft)),
        OrderBy::CreatedAsc => a.date_created.cmp(&b.date_created),
        OrderBy::CreatedDesc => b.date_created.cmp(&a.date_created),
        OrderBy::SlugAsc => a.slug.cmp(&b.slug),
        OrderBy::SlugDesc => b.slug.cmp(&a.slug),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ElementSource for MemoryStore {
    async fn find(&self, criteria: &ElementCriteria) -> Result<Vec<Element>> {
        let state = self.state.read().await;
        let mut matched: Vec<Element> = state
            .elements
            .iter()
            .filter(|element| state.matches(criteria, element))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare(criteria.order_by, a, b));

        let offset = criteria.offset.unwrap_or(0);
        if offset > 0 {
            matched.drain(..offset.min(matched.len()));
        }
        if let Some(limit) = criteria.limit {
            matched.truncate(limit);
        }

        tracing::debug!(
            "criteria over '{}' matched {} element(s)",
            criteria.element_type,
            matched.len()
        );
        Ok(matched)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_content(&self, element: &Element) -> Result<Option<Content>> {
        if element.id.is_none() {
            return Ok(None);
        }
        let state = self.state.read().await;
        Ok(state
            .contents
            .iter()
            .find(|content| content.element_id == element.id && content.locale == element.locale)
            .cloned())
    }

    async fn create_content(&self, element: &Element) -> Result<Content> {
        let mut content = Content::for_element(element);
        content.id = Some(Uuid::new_v4().to_string());
        // Rows for unsaved elements are handed back but not retained
        if element.id.is_some() {
            let mut state = self.state.write().await;
            state.contents.push(content.clone());
        }
        Ok(content)
    }
}

#[async_trait]
impl FieldRegistry for MemoryStore {
    async fn field_by_handle(&self, handle: &str, context: &str) -> Result<Option<Field>> {
        let state = self.state.read().await;
        Ok(state
            .fields
            .iter()
            .find(|field| field.handle == handle && field.context == context)
            .cloned())
    }

    async fn layout(&self, element_type: &str) -> Result<Option<FieldLayout>> {
        let state = self.state.read().await;
        Ok(state.layouts.get(element_type).cloned())
    }

    fn field_type(&self, kind: &str) -> Option<Arc<dyn FieldType>> {
        self.field_types.get(kind)
    }
}
