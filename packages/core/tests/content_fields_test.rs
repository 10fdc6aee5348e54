//! Integration tests for element content and custom fields
//!
//! Tests cover:
//! - Content loading, lazy creation and memoization
//! - Posted value handling through the field layout
//! - Field value preparation and its cache, null results included
//! - Field definition lookup caching per handle
//! - Dynamic attribute reads and guarded writes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use trellis_core::behaviors::FieldType;
use trellis_core::error::ElementError;
use trellis_core::models::{Content, Element, Field, FieldLayout, PostedContent};
use trellis_core::store::{ContentStore, FieldRegistry, MemoryStore};

/// Content store wrapper that counts loads and creations
struct CountingContentStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    creates: AtomicUsize,
}

impl CountingContentStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.gets.load(Ordering::SeqCst),
            self.creates.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl ContentStore for CountingContentStore {
    async fn get_content(&self, element: &Element) -> Result<Option<Content>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_content(element).await
    }

    async fn create_content(&self, element: &Element) -> Result<Content> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_content(element).await
    }
}

/// Field registry wrapper that counts definition lookups
struct CountingRegistry {
    inner: MemoryStore,
    lookups: AtomicUsize,
}

impl CountingRegistry {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldRegistry for CountingRegistry {
    async fn field_by_handle(&self, handle: &str, context: &str) -> Result<Option<Field>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.field_by_handle(handle, context).await
    }

    async fn layout(&self, element_type: &str) -> Result<Option<FieldLayout>> {
        self.inner.layout(element_type).await
    }

    fn field_type(&self, kind: &str) -> Option<Arc<dyn FieldType>> {
        self.inner.field_type(kind)
    }
}

/// Store with a body/rating/published/mystery layout for entries
///
/// The mystery field's kind has no registered field type, so its values pass
/// through untouched.
async fn seeded_store() -> MemoryStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let store = MemoryStore::new();
    let body = Field::new("body".to_string(), "Body".to_string(), "plainText".to_string());
    let rating = Field::new("rating".to_string(), "Rating".to_string(), "number".to_string());
    let published = Field::new(
        "published".to_string(),
        "Published".to_string(),
        "date".to_string(),
    );
    let mystery = Field::new(
        "mystery".to_string(),
        "Mystery".to_string(),
        "mystery".to_string(),
    );
    for field in [&body, &rating, &published, &mystery] {
        store.add_field(field.clone()).await;
    }
    store
        .set_layout(
            FieldLayout::new("entry".to_string())
                .with_field(body)
                .with_field(rating)
                .with_field(published)
                .with_field(mystery),
        )
        .await;
    store
}

fn entry() -> Element {
    Element::new("entry".to_string())
        .with_id("e1".to_string())
        .with_slug("e1".to_string())
}

fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(handle, value)| (handle.to_string(), value.clone()))
        .collect()
}

// =========================================================================
// Content Loading Tests
// =========================================================================

#[tokio::test]
async fn test_content_loads_an_existing_row_once() -> Result<()> {
    let inner = seeded_store().await;
    inner
        .add_content(
            Content::for_element(&entry())
                .with_title("Hello".to_string())
                .with_field_value("body".to_string(), json!("first draft")),
        )
        .await;
    let store = CountingContentStore::new(inner);

    let mut element = entry();
    let content = element.content(&store).await?;
    assert_eq!(content.title.as_deref(), Some("Hello"));
    assert_eq!(store.counts(), (1, 0));

    element.content(&store).await?;
    assert_eq!(store.counts(), (1, 0), "Loaded content should be memoized");
    Ok(())
}

#[tokio::test]
async fn test_content_creates_and_retains_a_blank_row() -> Result<()> {
    let store = CountingContentStore::new(seeded_store().await);

    let mut element = entry();
    let content = element.content(&store).await?;
    assert!(content.id.is_some());
    assert_eq!(content.element_id.as_deref(), Some("e1"));
    assert_eq!(store.counts(), (1, 1));

    // The created row is persisted for saved elements
    let reloaded = store.inner.get_content(&entry()).await?;
    assert!(reloaded.is_some());
    Ok(())
}

#[tokio::test]
async fn test_unsaved_elements_keep_content_in_memory() -> Result<()> {
    let store = CountingContentStore::new(seeded_store().await);

    let mut unsaved = Element::new("entry".to_string());
    unsaved.content(&store).await?;
    assert_eq!(store.counts(), (1, 1));

    // Memoized on the element, nothing retained by the store
    unsaved.content(&store).await?;
    assert_eq!(store.counts(), (1, 1));
    assert!(store.inner.get_content(&unsaved).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_title_and_merged_values() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    assert_eq!(element.title(&store).await?, None);

    element
        .set_content_values(
            values(&[("title", json!("Launch day")), ("body", json!("soon"))]),
            &store,
        )
        .await?;
    assert_eq!(element.title(&store).await?.as_deref(), Some("Launch day"));
    assert_eq!(
        element.content(&store).await?.field_value("body"),
        Some(&json!("soon"))
    );
    Ok(())
}

// =========================================================================
// Posted Content Tests
// =========================================================================

#[tokio::test]
async fn test_posted_values_run_through_field_types() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    let post = PostedContent::from(values(&[
        ("body", json!("  padded  ")),
        ("rating", json!("4.5")),
        ("published", json!("2025-06-01T12:00:00+02:00")),
        ("mystery", json!({"x": 1})),
    ]));
    element.set_content_from_post(post, &store, &store).await?;

    let content = element.content(&store).await?;
    assert_eq!(content.field_value("body"), Some(&json!("padded")));
    assert_eq!(content.field_value("rating"), Some(&json!(4.5)));
    assert_eq!(
        content.field_value("published"),
        Some(&json!("2025-06-01T10:00:00+00:00"))
    );
    assert_eq!(content.field_value("mystery"), Some(&json!({"x": 1})));

    // Raw submissions are captured before preparation
    let raw = element.raw_post_content();
    assert_eq!(raw.get("body"), Some(&json!("  padded  ")));
    assert_eq!(raw.get("rating"), Some(&json!("4.5")));
    assert_eq!(raw.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_upload_only_fields_post_null() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    let post = PostedContent::at_location("fields".to_string(), values(&[("body", json!("text"))]))
        .with_file("fields.rating".to_string());
    element.set_content_from_post(post, &store, &store).await?;

    assert_eq!(element.content_post_location(), Some("fields"));

    let content = element.content(&store).await?;
    assert_eq!(content.field_value("body"), Some(&json!("text")));
    assert_eq!(content.field_value("rating"), Some(&Value::Null));
    assert_eq!(content.field_value("published"), None);
    assert_eq!(content.field_value("mystery"), None);

    // Upload-only fields leave nothing in the raw capture
    assert_eq!(element.raw_post_content().len(), 1);
    assert!(element.raw_post_content().contains_key("body"));
    Ok(())
}

#[tokio::test]
async fn test_values_outside_the_layout_are_ignored() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    let post = PostedContent::from(values(&[("unbound", json!("x"))]));
    element.set_content_from_post(post, &store, &store).await?;

    assert!(element.content(&store).await?.fields.is_empty());
    assert!(element.raw_post_content().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_post_without_layout_is_inert() -> Result<()> {
    let registry = seeded_store().await;
    let contents = CountingContentStore::new(seeded_store().await);

    let mut category = Element::new("category".to_string()).with_id("cat".to_string());
    let post = PostedContent::from(values(&[("body", json!("text"))]));
    category
        .set_content_from_post(post, &registry, &contents)
        .await?;

    assert_eq!(contents.counts(), (0, 0), "No layout means no content work");
    Ok(())
}

// =========================================================================
// Field Value Tests
// =========================================================================

#[tokio::test]
async fn test_field_values_prep_and_memoize() -> Result<()> {
    let inner = seeded_store().await;
    inner
        .add_content(
            Content::for_element(&entry()).with_field_value("body".to_string(), json!(42)),
        )
        .await;
    let registry = seeded_store().await;
    let store = CountingContentStore::new(inner);

    let mut element = entry();
    // Plain text preparation stringifies non-string scalars
    let value = element.field_value("body", &registry, &store).await?;
    assert_eq!(value, json!("42"));
    assert_eq!(store.counts(), (1, 0));

    let value = element.field_value("body", &registry, &store).await?;
    assert_eq!(value, json!("42"));
    assert_eq!(store.counts(), (1, 0), "Prepped values should be memoized");
    Ok(())
}

#[tokio::test]
async fn test_missing_values_prep_to_null_and_cache() -> Result<()> {
    let inner = seeded_store().await;
    inner.add_content(Content::for_element(&entry())).await;
    let registry = seeded_store().await;
    let store = CountingContentStore::new(inner);

    let mut element = entry();
    assert_eq!(
        element.field_value("rating", &registry, &store).await?,
        Value::Null
    );
    assert_eq!(store.counts(), (1, 0));

    assert_eq!(
        element.field_value("rating", &registry, &store).await?,
        Value::Null
    );
    assert_eq!(store.counts(), (1, 0), "Null results are cached like any other");
    Ok(())
}

#[tokio::test]
async fn test_unknown_handles_error_and_cache_no_value() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    let error = element
        .field_value("nope", &store, &store)
        .await
        .expect_err("Unknown handles should not resolve");
    assert!(matches!(error, ElementError::FieldNotFound { .. }));
    assert_eq!(
        error.to_string(),
        "No field exists with the handle 'nope'"
    );

    // The failure left nothing prepped: a repeat fails the same way instead
    // of serving a cached null
    let error = element
        .field_value("nope", &store, &store)
        .await
        .expect_err("The failed lookup should not leave a value behind");
    assert!(matches!(error, ElementError::FieldNotFound { .. }));

    // Once the field exists, an element without the memoized miss preps it
    store
        .add_field(Field::new(
            "nope".to_string(),
            "Late Addition".to_string(),
            "plainText".to_string(),
        ))
        .await;
    let mut fresh = entry();
    assert_eq!(
        fresh.field_value("nope", &store, &store).await?,
        Value::Null
    );
    Ok(())
}

#[tokio::test]
async fn test_field_definitions_cache_hits_and_misses() -> Result<()> {
    let registry = CountingRegistry::new(seeded_store().await);
    let mut element = entry();

    assert!(element.field_by_handle("body", &registry).await?.is_some());
    assert_eq!(registry.count(), 1);
    assert!(element.field_by_handle("body", &registry).await?.is_some());
    assert_eq!(registry.count(), 1);

    assert!(!element.has_attribute("nope", &registry).await?);
    assert_eq!(registry.count(), 2);
    assert!(!element.has_attribute("nope", &registry).await?);
    assert_eq!(registry.count(), 2, "Missing fields are remembered per handle");
    Ok(())
}

#[tokio::test]
async fn test_field_lookups_respect_the_element_context() -> Result<()> {
    let store = seeded_store().await;
    store
        .add_field(
            Field::new(
                "body".to_string(),
                "Block Body".to_string(),
                "plainText".to_string(),
            )
            .with_context("matrixBlockType:1".to_string()),
        )
        .await;

    let mut block = entry().with_field_context("matrixBlockType:1".to_string());
    let field = block.field_by_handle("body", &store).await?;
    assert_eq!(field.map(|f| f.name.as_str()), Some("Block Body"));

    // The global-context definition is a different field entirely
    let mut element = entry();
    let field = element.field_by_handle("body", &store).await?;
    assert_eq!(field.map(|f| f.name.as_str()), Some("Body"));
    Ok(())
}

// =========================================================================
// Dynamic Attribute Tests
// =========================================================================

#[tokio::test]
async fn test_attributes_resolve_builtins_title_and_fields() -> Result<()> {
    let store = seeded_store().await;
    store
        .add_content(
            Content::for_element(&entry())
                .with_title("Hello".to_string())
                .with_field_value("body".to_string(), json!("copy")),
        )
        .await;

    let mut element = entry();
    assert_eq!(element.attribute("slug", &store, &store).await?, json!("e1"));
    assert_eq!(
        element.attribute("status", &store, &store).await?,
        json!("enabled")
    );
    assert_eq!(
        element.attribute("title", &store, &store).await?,
        json!("Hello")
    );
    assert_eq!(
        element.attribute("body", &store, &store).await?,
        json!("copy")
    );

    let error = element
        .attribute("bogus", &store, &store)
        .await
        .expect_err("Names that are neither attributes nor fields should fail");
    assert!(matches!(error, ElementError::UnknownAttribute { .. }));
    Ok(())
}

#[tokio::test]
async fn test_has_attribute_spans_both_tiers() -> Result<()> {
    let store = seeded_store().await;
    let mut element = entry();

    assert!(element.has_attribute("enabled", &store).await?);
    assert!(element.has_attribute("title", &store).await?);
    assert!(element.has_attribute("rating", &store).await?);
    assert!(!element.has_attribute("bogus", &store).await?);
    Ok(())
}

#[tokio::test]
async fn test_set_attribute_writes_builtins_with_guards() -> Result<()> {
    let mut element = Element::new("entry".to_string());

    element.set_attribute("id", json!("fresh"))?;
    assert_eq!(element.id.as_deref(), Some("fresh"));
    let error = element
        .set_attribute("id", json!("other"))
        .expect_err("An assigned id should be immutable");
    assert!(matches!(error, ElementError::ReadOnlyAttribute { .. }));

    element.set_attribute("enabled", json!(false))?;
    assert_eq!(element.status().as_str(), "disabled");

    element.set_attribute("lft", json!(3))?;
    assert_eq!(element.lft, Some(3));
    element.set_attribute("lft", Value::Null)?;
    assert_eq!(element.lft, None);

    for name in ["status", "title", "total_descendants"] {
        let error = element
            .set_attribute(name, json!("x"))
            .expect_err("Derived attributes should reject writes");
        assert!(matches!(error, ElementError::ReadOnlyAttribute { .. }));
    }

    let error = element
        .set_attribute("bogus", json!("x"))
        .expect_err("Unknown names should be rejected");
    assert!(matches!(error, ElementError::UnknownAttribute { .. }));

    let error = element
        .set_attribute("slug", json!(5))
        .expect_err("A numeric slug should be rejected");
    assert!(matches!(error, ElementError::InvalidAttributeValue { .. }));
    Ok(())
}
