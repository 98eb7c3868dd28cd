//! Field definition resolution.
//!
//! Resolves which field definitions apply to a set of raw values: the
//! content type's top-level schema, a repeater's sub-fields, or the
//! sub-fields of the flexible-content layout selected by the discriminator.

use staticjson_core::{ContentStore, Entity, FieldDefinition, FieldKind, FieldScope, StoreError};
use thiserror::Error;

/// Schema resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A field name is not declared in the applicable schema.
    #[error("field {name:?} is not declared")]
    FieldNotFound { name: String },

    /// The container key no longer resolves to a definition.
    #[error("container field {key:?} not found")]
    ContainerNotFound { key: String },

    /// The discriminator names no declared layout.
    #[error("layout {layout:?} is not declared by field {field:?}")]
    UnknownLayout {
        field: String,
        layout: Option<String>,
    },

    /// The parent field has no nested schema.
    #[error("field {field:?} of kind {kind} has no sub-fields")]
    NotAContainer { field: String, kind: FieldKind },

    /// Store lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Enclosing container of a nested field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentContext<'a> {
    /// Key of the container field.
    pub field_key: &'a str,

    /// Active layout, taken from the discriminator (flexible content only).
    pub layout: Option<&'a str>,
}

impl<'a> ParentContext<'a> {
    /// Context of a repeater row.
    pub fn repeater(field_key: &'a str) -> Self {
        Self {
            field_key,
            layout: None,
        }
    }

    /// Context of a flexible-content element.
    pub fn flexible(field_key: &'a str, layout: Option<&'a str>) -> Self {
        Self { field_key, layout }
    }
}

/// Ordered field definitions applying to one set of raw values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<FieldDefinition>,
}

impl FieldSet {
    /// Wrap definitions in declaration order.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    /// Find a definition by field name.
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Resolves field definitions through the content store.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Resolve the definitions applying in `parent` (or at the top level of
    /// `entity` when `parent` is `None`).
    ///
    /// This is what the serializer walks: one lookup per field set, in
    /// declaration order. Nested schemas are looked up within the entity's
    /// own content type.
    pub fn scope(&self, entity: &Entity, parent: Option<&ParentContext<'_>>) -> Result<FieldSet> {
        let Some(parent) = parent else {
            let def = self.store.content_type(&entity.content_type)?;
            return Ok(FieldSet::new(def.fields));
        };

        let container = self
            .store
            .field_definition(
                "",
                FieldScope::Parent {
                    content_type: &entity.content_type,
                    key: parent.field_key,
                },
            )?
            .ok_or_else(|| ResolveError::ContainerNotFound {
                key: parent.field_key.to_string(),
            })?;

        match container.kind {
            FieldKind::FlexibleContent => {
                let layout = parent
                    .layout
                    .and_then(|name| container.layout(name))
                    .ok_or_else(|| ResolveError::UnknownLayout {
                        field: container.name.clone(),
                        layout: parent.layout.map(str::to_string),
                    })?;
                Ok(FieldSet::new(layout.sub_fields.clone()))
            }
            FieldKind::Repeater => Ok(FieldSet::new(container.sub_fields)),
            kind => Err(ResolveError::NotAContainer {
                field: container.name,
                kind,
            }),
        }
    }

    /// Resolve a single field definition.
    ///
    /// Nested definitions must point back at the requested container
    /// through their `parent_key`.
    pub fn resolve(
        &self,
        name: &str,
        entity: &Entity,
        parent: Option<&ParentContext<'_>>,
    ) -> Result<FieldDefinition> {
        let found = match parent {
            None => self
                .store
                .field_definition(name, FieldScope::Entity(entity.id))?,
            Some(ctx) => self
                .scope(entity, parent)?
                .get(name)
                .filter(|def| def.parent_key.as_deref() == Some(ctx.field_key))
                .cloned(),
        };

        found.ok_or_else(|| ResolveError::FieldNotFound {
            name: name.to_string(),
        })
    }
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
