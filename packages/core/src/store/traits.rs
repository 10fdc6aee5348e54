//! Collaborator Traits - Storage Abstraction Layer
//!
//! This module defines the three traits elements resolve their lazy state
//! through. The traits keep the element model free of storage concerns and
//! enable multiple backend implementations without changing element logic.
//!
//! # Architecture
//!
//! - **ElementSource**: executes criteria queries (matching, ordering, id
//!   projection)
//! - **ContentStore**: loads and creates per-element, per-locale content rows
//! - **FieldRegistry**: resolves field definitions, layouts and field-type
//!   behaviors
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All lookup methods are async so embedded and network
//!    backends satisfy the same contract
//! 2. **Explicit context**: `field_by_handle` takes the context as a
//!    parameter; there is no ambient context state to swap around a call
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context;
//!    element operations chain these transparently
//! 4. **Detached results**: Returned elements and content are snapshots the
//!    caller owns outright
//!
//! # Examples
//!
//! ```rust
//! use trellis_core::models::{Element, ElementCriteria};
//! use trellis_core::store::{ElementSource, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let stored = store
//!     .add_element(Element::new("entry".to_string()).with_slug("home".to_string()))
//!     .await;
//!
//! let found = ElementCriteria::new("entry".to_string())
//!     .first(&store)
//!     .await
//!     .unwrap();
//! assert_eq!(found.unwrap().id, stored.id);
//! # });
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::behaviors::FieldType;
use crate::models::{Content, Element, ElementCriteria, Field, FieldLayout};

/// Executes element criteria queries
///
/// Implementations own matching, ordering, limit and offset; `first` and
/// `ids` have default implementations in terms of `find`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow usage in async contexts
/// where futures may be moved between threads.
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// All elements matching `criteria`, in criteria order
    async fn find(&self, criteria: &ElementCriteria) -> Result<Vec<Element>>;

    /// First element matching `criteria`, if any
    async fn first(&self, criteria: &ElementCriteria) -> Result<Option<Element>> {
        Ok(self.find(criteria).await?.into_iter().next())
    }

    /// Ids of matching elements, in criteria order
    ///
    /// Elements without an assigned id are skipped.
    async fn ids(&self, criteria: &ElementCriteria) -> Result<Vec<String>> {
        Ok(self
            .find(criteria)
            .await?
            .into_iter()
            .filter_map(|element| element.id)
            .collect())
    }
}

/// Loads and creates per-element, per-locale content rows
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Existing content row for the element's id and locale
    async fn get_content(&self, element: &Element) -> Result<Option<Content>>;

    /// Create a blank content row bound to the element
    async fn create_content(&self, element: &Element) -> Result<Content>;
}

/// Resolves field definitions, layouts and field-type behaviors
#[async_trait]
pub trait FieldRegistry: Send + Sync {
    /// Field registered under `handle` inside `context`, if any
    async fn field_by_handle(&self, handle: &str, context: &str) -> Result<Option<Field>>;

    /// Field layout attached to an element type, if any
    async fn layout(&self, element_type: &str) -> Result<Option<FieldLayout>>;

    /// Behavior for a field-type kind
    ///
    /// Pure registry lookup; `None` means values of this kind flow through
    /// unprepared.
    fn field_type(&self, kind: &str) -> Option<Arc<dyn FieldType>>;
}
