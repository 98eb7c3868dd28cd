//! Field kind dispatch and the built-in transforms.
//!
//! Each field kind maps to a [`Transform`]. Leaf kinds map to pure functions
//! of the raw value; container kinds and entity references are walked by the
//! serializer. Kinds without a built-in transform are looked up in the
//! [`TransformRegistry`] and otherwise passed through unchanged.
//!
//! The registry also holds entity transforms, which post-process a whole
//! serialized entity of one content type or one page.

use std::collections::HashMap;

use serde_json::{Map, Value, json};
use staticjson_core::{ContentStore, Entity, EntityId, FieldDefinition, FieldKind, Language};
use thiserror::Error;
use tracing::{debug, warn};

use crate::links::LinkBuilder;

/// Taxonomy queried when a taxonomy field does not name one.
pub const DEFAULT_TAXONOMY: &str = "category";

/// Content type whose entities take page transforms.
const PAGE_TYPE: &str = "page";

/// Everything a transform may read.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    pub store: &'a dyn ContentStore,
    pub language: &'a Language,
    pub links: &'a LinkBuilder,
    /// Entity whose fields are being serialized.
    pub entity: &'a Entity,
    /// Definition of the field being transformed.
    pub field: &'a FieldDefinition,
    /// Rendition emitted as an image's `thumbnail`.
    pub thumbnail_size: &'a str,
}

/// A transform for a custom field kind.
pub trait FieldTransform: Send + Sync {
    fn transform(&self, raw: &Value, cx: &TransformContext<'_>) -> Value;
}

impl<F> FieldTransform for F
where
    F: Fn(&Value, &TransformContext<'_>) -> Value + Send + Sync,
{
    fn transform(&self, raw: &Value, cx: &TransformContext<'_>) -> Value {
        self(raw, cx)
    }
}

/// Everything an entity transform may read.
#[derive(Clone, Copy)]
pub struct EntityContext<'a> {
    pub store: &'a dyn ContentStore,
    pub language: &'a Language,
    pub links: &'a LinkBuilder,
    /// Entity that was serialized.
    pub entity: &'a Entity,
}

/// Post-processing of a serialized entity.
pub trait EntityTransform: Send + Sync {
    fn transform(&self, node: Map<String, Value>, cx: &EntityContext<'_>) -> Map<String, Value>;
}

impl<F> EntityTransform for F
where
    F: Fn(Map<String, Value>, &EntityContext<'_>) -> Map<String, Value> + Send + Sync,
{
    fn transform(&self, node: Map<String, Value>, cx: &EntityContext<'_>) -> Map<String, Value> {
        self(node, cx)
    }
}

/// Signature of the built-in leaf transforms.
pub type LeafFn = fn(&Value, &TransformContext<'_>) -> Value;

/// What to do with a field of a given kind.
pub enum Transform<'a> {
    /// Pure function of the raw value.
    Leaf(LeafFn),
    /// Registered custom transform.
    Custom(&'a dyn FieldTransform),
    /// Ordered rows sharing one schema.
    Repeater,
    /// Ordered rows whose schema is picked by the discriminator.
    FlexibleContent,
    /// Reference(s) to other entities.
    PostObject,
    /// Raw value emitted unchanged.
    Passthrough,
}

impl std::fmt::Debug for Transform<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Leaf(_) => "Leaf",
            Self::Custom(_) => "Custom",
            Self::Repeater => "Repeater",
            Self::FlexibleContent => "FlexibleContent",
            Self::PostObject => "PostObject",
            Self::Passthrough => "Passthrough",
        };
        f.write_str(name)
    }
}

/// Transform registration errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The kind already has a registered transform.
    #[error("a transform for field kind {0:?} is already registered")]
    Duplicate(String),

    /// The name belongs to a built-in kind.
    #[error("field kind {0:?} is built in and cannot be overridden")]
    Builtin(String),

    /// The content type or page already has an entity transform.
    #[error("an entity transform for {0} is already registered")]
    DuplicateEntity(String),
}

/// Open table of transforms for custom field kinds and entities.
#[derive(Default)]
pub struct TransformRegistry {
    custom: HashMap<String, Box<dyn FieldTransform>>,
    /// Content type name to its entity transform.
    content_types: HashMap<String, Box<dyn EntityTransform>>,
    /// Page slug to its entity transform.
    pages: HashMap<String, Box<dyn EntityTransform>>,
}

impl TransformRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform for a custom kind name.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        transform: impl FieldTransform + 'static,
    ) -> Result<&mut Self, RegistryError> {
        let kind = kind.into();
        if FieldKind::is_builtin_name(&kind) {
            return Err(RegistryError::Builtin(kind));
        }
        if self.custom.contains_key(&kind) {
            return Err(RegistryError::Duplicate(kind));
        }

        debug!(kind = %kind, "registered field transform");
        self.custom.insert(kind, Box::new(transform));
        Ok(self)
    }

    /// Register a transform applied to every entity of `content_type`,
    /// whether exported directly or reached through a reference.
    pub fn register_content_type(
        &mut self,
        content_type: impl Into<String>,
        transform: impl EntityTransform + 'static,
    ) -> Result<&mut Self, RegistryError> {
        let content_type = content_type.into();
        if self.content_types.contains_key(&content_type) {
            return Err(RegistryError::DuplicateEntity(format!(
                "content type {content_type:?}"
            )));
        }

        debug!(content_type = %content_type, "registered entity transform");
        self.content_types.insert(content_type, Box::new(transform));
        Ok(self)
    }

    /// Register a transform applied to the page with `slug`, after any
    /// transform of the `page` content type.
    pub fn register_page(
        &mut self,
        slug: impl Into<String>,
        transform: impl EntityTransform + 'static,
    ) -> Result<&mut Self, RegistryError> {
        let slug = slug.into();
        if self.pages.contains_key(&slug) {
            return Err(RegistryError::DuplicateEntity(format!("page {slug:?}")));
        }

        debug!(slug = %slug, "registered page transform");
        self.pages.insert(slug, Box::new(transform));
        Ok(self)
    }

    /// Entity transforms applying to `entity`, in application order.
    pub fn entity_transforms<'a>(
        &'a self,
        entity: &Entity,
    ) -> impl Iterator<Item = &'a dyn EntityTransform> {
        let by_type = self.content_types.get(&entity.content_type);
        let by_slug = if entity.content_type == PAGE_TYPE {
            self.pages.get(&entity.slug)
        } else {
            None
        };

        by_type.into_iter().chain(by_slug).map(|t| t.as_ref())
    }

    /// Whether a custom kind has a transform.
    pub fn contains(&self, kind: &str) -> bool {
        self.custom.contains_key(kind)
    }

    /// Number of registered custom transforms.
    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Map a field kind to its transform.
    pub fn dispatch(&self, kind: &FieldKind) -> Transform<'_> {
        match kind {
            FieldKind::Repeater => Transform::Repeater,
            FieldKind::FlexibleContent => Transform::FlexibleContent,
            FieldKind::PostObject => Transform::PostObject,
            FieldKind::Url => Transform::Leaf(url),
            FieldKind::Image => Transform::Leaf(image),
            FieldKind::File => Transform::Leaf(file),
            FieldKind::Taxonomy => Transform::Leaf(taxonomy),
            FieldKind::Gallery => Transform::Leaf(gallery),
            FieldKind::Seo => Transform::Leaf(seo),
            FieldKind::Text => Transform::Passthrough,
            FieldKind::Custom(name) => match self.custom.get(name) {
                Some(transform) => Transform::Custom(transform.as_ref()),
                None => Transform::Passthrough,
            },
        }
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.custom.keys().collect();
        kinds.sort();
        let mut types: Vec<_> = self.content_types.keys().collect();
        types.sort();
        let mut pages: Vec<_> = self.pages.keys().collect();
        pages.sort();
        f.debug_struct("TransformRegistry")
            .field("custom", &kinds)
            .field("content_types", &types)
            .field("pages", &pages)
            .finish()
    }
}

/// Read a non-zero id from a raw reference.
fn reference_id(raw: &Value) -> Option<EntityId> {
    EntityId::from_value(raw).filter(|id| id.0 != 0)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Link to a referenced entity; strings are treated as external links.
pub fn url(raw: &Value, cx: &TransformContext<'_>) -> Value {
    match raw {
        Value::Null | Value::String(_) => raw.clone(),
        _ => {
            let Some(id) = reference_id(raw) else {
                return raw.clone();
            };
            match cx.links.resolve(cx.store, id, cx.language) {
                Ok(link) => Value::String(link),
                Err(e) => {
                    warn!(field = %cx.field.name, id = %id, error = %e, "unresolved link");
                    Value::Null
                }
            }
        }
    }
}

/// Image with its original size and thumbnail rendition.
pub fn image(raw: &Value, cx: &TransformContext<'_>) -> Value {
    let Some(id) = reference_id(raw) else {
        return Value::Null;
    };
    let Some(asset) = cx.store.asset(id) else {
        debug!(field = %cx.field.name, id = %id, "image asset not found");
        return Value::Null;
    };

    let alt = non_empty_str(raw.get("alt")).unwrap_or(&asset.alt);
    let caption = raw.get("caption").cloned().unwrap_or(Value::Null);
    let thumbnail = asset.rendition(cx.thumbnail_size);

    json!({
        "url": asset.url,
        "width": asset.width,
        "height": asset.height,
        "alt": alt,
        "caption": caption,
        "thumbnail": {
            "url": thumbnail.url,
            "width": thumbnail.width,
            "height": thumbnail.height,
        },
    })
}

/// File attachment reduced to its identifying members.
pub fn file(raw: &Value, _cx: &TransformContext<'_>) -> Value {
    if reference_id(raw).is_none() {
        return raw.clone();
    }

    let member = |name: &str| raw.get(name).cloned().unwrap_or(Value::Null);
    json!({
        "id": member("id"),
        "name": member("filename"),
        "url": member("url"),
        "type": member("mime_type"),
    })
}

/// Terms as an array of `{id, name, slug, ...custom attributes}`.
pub fn taxonomy(raw: &Value, cx: &TransformContext<'_>) -> Value {
    let taxonomy = cx.field.taxonomy.as_deref().unwrap_or(DEFAULT_TAXONOMY);
    let items: &[Value] = match raw {
        Value::Null => &[],
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    };

    let terms = items
        .iter()
        .filter_map(|item| {
            let id = reference_id(item)?;
            let Some(term) = cx.store.term(taxonomy, id) else {
                debug!(taxonomy, id = %id, "term not found");
                return None;
            };

            let mut data = Map::new();
            data.insert("id".to_string(), json!(term.id));
            data.insert("name".to_string(), json!(term.name));
            data.insert("slug".to_string(), json!(term.slug));
            data.extend(term.fields);
            Some(Value::Object(data))
        })
        .collect();

    Value::Array(terms)
}

/// Array of image transforms.
pub fn gallery(raw: &Value, cx: &TransformContext<'_>) -> Value {
    match raw {
        Value::Array(images) => images.iter().map(|img| image(img, cx)).collect(),
        _ => Value::Array(Vec::new()),
    }
}

/// Search-engine metadata of the current entity.
pub fn seo(_raw: &Value, cx: &TransformContext<'_>) -> Value {
    seo_for(cx.entity)
}

/// Search-engine metadata with fallbacks to the entity's title and slug.
pub fn seo_for(entity: &Entity) -> Value {
    let meta = &entity.seo;
    let pick = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    json!({
        "title": pick(&meta.title, &entity.title),
        "slug": pick(&meta.slug, &entity.slug),
        "meta_description": pick(&meta.meta_description, ""),
        "og_title": pick(&meta.og_title, &entity.title),
        "og_description": pick(&meta.og_description, ""),
        "og_image": pick(&meta.og_image, ""),
    })
}
