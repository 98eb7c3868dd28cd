//! Recursive field serialization.
//!
//! Walks an entity's raw field data in schema declaration order, resolving
//! each field's definition, dispatching its transform, and recursing into
//! repeaters, flexible content and entity references.

use serde_json::{Map, Value, json};
use staticjson_core::{ContentStore, Entity, EntityId, FieldDefinition, FieldMap, Language, StoreError};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    dispatch::{self, EntityContext, Transform, TransformContext, TransformRegistry},
    links::LinkBuilder,
    resolver::{FieldSet, ParentContext, ResolveError, Resolver},
};

/// Keys of the entity envelope; schemas may not declare them.
pub const RESERVED_KEYS: [&str; 4] = ["id", "slug", "seo", "subpages"];

/// A serialized field set, keys in schema order.
pub type SerializedNode = Map<String, Value>;

/// Serialization errors; each one aborts the current entity only.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// Nesting exceeded the configured ceiling.
    #[error("maximum nesting depth {max} exceeded at field {field:?}")]
    DepthExceeded { field: String, max: usize },

    /// The entity's top-level schema could not be resolved.
    #[error("schema error: {0}")]
    Schema(#[from] ResolveError),

    /// Store lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for serializer operations.
pub type Result<T> = std::result::Result<T, SerializeError>;

/// Options of the field walk.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Name of the flexible-content discriminator.
    pub layout_key: String,
    /// Nesting ceiling.
    pub max_depth: usize,
    /// Image rendition emitted as `thumbnail`.
    pub thumbnail_size: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            layout_key: "acf_fc_layout".to_string(),
            max_depth: 32,
            thumbnail_size: "medium".to_string(),
        }
    }
}

/// Per-walk state.
#[derive(Debug, Default)]
struct Walk {
    depth: usize,
    /// Entities currently being serialized, outermost first.
    stack: Vec<EntityId>,
}

/// Serializes entities for one language.
pub struct Serializer<'a> {
    store: &'a dyn ContentStore,
    resolver: Resolver<'a>,
    registry: &'a TransformRegistry,
    language: &'a Language,
    links: &'a LinkBuilder,
    options: &'a SerializeOptions,
}

impl<'a> Serializer<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn ContentStore,
        registry: &'a TransformRegistry,
        language: &'a Language,
        links: &'a LinkBuilder,
        options: &'a SerializeOptions,
    ) -> Self {
        Self {
            store,
            resolver: Resolver::new(store),
            registry,
            language,
            links,
            options,
        }
    }

    /// Serialize an entity: `id`, `slug`, its fields, then `seo`, passed
    /// through the entity transforms registered for it.
    pub fn serialize_entity(&self, entity: &Entity) -> Result<SerializedNode> {
        let mut walk = Walk {
            depth: 0,
            stack: vec![entity.id],
        };
        self.entity_node(entity, &mut walk)
    }

    /// Serialize a raw field set of `entity` within `parent`.
    pub fn serialize_fields(
        &self,
        entity: &Entity,
        raw: &FieldMap,
        parent: Option<&ParentContext<'_>>,
    ) -> Result<SerializedNode> {
        let scope = self.resolver.scope(entity, parent)?;
        let mut walk = Walk {
            depth: 0,
            stack: vec![entity.id],
        };
        self.fields(entity, raw, &scope, &mut walk)
    }

    fn entity_node(&self, entity: &Entity, walk: &mut Walk) -> Result<SerializedNode> {
        trace!(id = %entity.id, content_type = %entity.content_type, "serializing entity");

        let scope = self.resolver.scope(entity, None)?;
        let fields = self.fields(entity, &entity.fields, &scope, walk)?;

        let mut node = SerializedNode::new();
        node.insert("id".to_string(), json!(entity.id));
        node.insert("slug".to_string(), json!(entity.slug));
        node.extend(fields);
        node.insert("seo".to_string(), dispatch::seo_for(entity));

        let cx = EntityContext {
            store: self.store,
            language: self.language,
            links: self.links,
            entity,
        };
        Ok(self
            .registry
            .entity_transforms(entity)
            .fold(node, |node, transform| transform.transform(node, &cx)))
    }

    fn fields(
        &self,
        entity: &Entity,
        raw: &FieldMap,
        scope: &FieldSet,
        walk: &mut Walk,
    ) -> Result<SerializedNode> {
        for name in raw.keys() {
            if !scope.contains(name) && *name != self.options.layout_key {
                debug!(entity = %entity.id, field = %name, "dropping undeclared field");
            }
        }

        let mut node = SerializedNode::new();
        for def in scope.iter() {
            let value = raw.get(&def.name).unwrap_or(&Value::Null);
            let out = self.value(entity, def, value, walk)?;
            node.insert(def.name.clone(), out);
        }
        Ok(node)
    }

    fn value(
        &self,
        entity: &Entity,
        def: &FieldDefinition,
        raw: &Value,
        walk: &mut Walk,
    ) -> Result<Value> {
        let cx = TransformContext {
            store: self.store,
            language: self.language,
            links: self.links,
            entity,
            field: def,
            thumbnail_size: &self.options.thumbnail_size,
        };

        match self.registry.dispatch(&def.kind) {
            Transform::Leaf(transform) => Ok(transform(raw, &cx)),
            Transform::Custom(transform) => Ok(transform.transform(raw, &cx)),
            Transform::Passthrough => Ok(raw.clone()),
            Transform::Repeater => self.repeater(entity, def, raw, walk),
            Transform::FlexibleContent => self.flexible(entity, def, raw, walk),
            Transform::PostObject => self.post_object(def, raw, walk),
        }
    }

    /// Rows of a container, or `None` when the raw value is not a list.
    fn rows<'v>(&self, entity: &Entity, def: &FieldDefinition, raw: &'v Value) -> Option<&'v [Value]> {
        match raw {
            Value::Null => Some(&[][..]),
            Value::Array(rows) => Some(rows.as_slice()),
            _ => {
                warn!(entity = %entity.id, field = %def.name, "container value is not a list");
                None
            }
        }
    }

    fn enter(&self, def: &FieldDefinition, walk: &mut Walk) -> Result<()> {
        if walk.depth >= self.options.max_depth {
            return Err(SerializeError::DepthExceeded {
                field: def.name.clone(),
                max: self.options.max_depth,
            });
        }
        walk.depth += 1;
        Ok(())
    }

    fn repeater(
        &self,
        entity: &Entity,
        def: &FieldDefinition,
        raw: &Value,
        walk: &mut Walk,
    ) -> Result<Value> {
        let Some(rows) = self.rows(entity, def, raw) else {
            return Ok(Value::Null);
        };

        let ctx = ParentContext::repeater(&def.key);
        let scope = match self.resolver.scope(entity, Some(&ctx)) {
            Ok(scope) => scope,
            Err(e) => {
                warn!(entity = %entity.id, field = %def.name, error = %e, "unresolved repeater");
                return Ok(Value::Null);
            }
        };

        self.enter(def, walk)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                Value::Object(row) => out.push(Value::Object(self.fields(entity, row, &scope, walk)?)),
                _ => out.push(Value::Null),
            }
        }
        walk.depth -= 1;

        Ok(Value::Array(out))
    }

    fn flexible(
        &self,
        entity: &Entity,
        def: &FieldDefinition,
        raw: &Value,
        walk: &mut Walk,
    ) -> Result<Value> {
        let Some(rows) = self.rows(entity, def, raw) else {
            return Ok(Value::Null);
        };

        let layout_key = self.options.layout_key.as_str();
        self.enter(def, walk)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(row) = row else {
                out.push(Value::Null);
                continue;
            };

            let mut node = SerializedNode::new();
            if let Some(discriminator) = row.get(layout_key) {
                node.insert(layout_key.to_string(), discriminator.clone());
            }

            let layout = row.get(layout_key).and_then(Value::as_str);
            let ctx = ParentContext::flexible(&def.key, layout);
            match self.resolver.scope(entity, Some(&ctx)) {
                Ok(scope) => node.extend(self.fields(entity, row, &scope, walk)?),
                Err(e) => {
                    warn!(entity = %entity.id, field = %def.name, error = %e, "unresolved layout");
                }
            }
            out.push(Value::Object(node));
        }
        walk.depth -= 1;

        Ok(Value::Array(out))
    }

    fn post_object(&self, def: &FieldDefinition, raw: &Value, walk: &mut Walk) -> Result<Value> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Array(refs) => refs
                .iter()
                .map(|r| self.reference(def, r, walk))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            single => self.reference(def, single, walk),
        }
    }

    fn reference(&self, def: &FieldDefinition, raw: &Value, walk: &mut Walk) -> Result<Value> {
        let Some(id) = EntityId::from_value(raw) else {
            return Ok(Value::Null);
        };

        let target = match self.store.entity(id, self.language.store_code()) {
            Ok(target) => target,
            Err(e) => {
                warn!(field = %def.name, id = %id, error = %e, "skipping unresolved reference");
                return Ok(Value::Null);
            }
        };

        if walk.stack.contains(&id) {
            warn!(field = %def.name, id = %id, "reference cycle; emitting stub");
            return Ok(json!({ "id": target.id, "slug": target.slug }));
        }

        self.enter(def, walk)?;
        walk.stack.push(id);
        let node = self.entity_node(&target, walk);
        walk.stack.pop();
        walk.depth -= 1;

        match node {
            Ok(node) => Ok(Value::Object(node)),
            Err(e @ SerializeError::DepthExceeded { .. }) => Err(e),
            Err(e) => {
                warn!(field = %def.name, id = %id, error = %e, "skipping unserializable reference");
                Ok(Value::Null)
            }
        }
    }
}

impl std::fmt::Debug for Serializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("language", &self.language.code)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
