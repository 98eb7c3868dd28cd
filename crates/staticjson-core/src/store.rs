//! Read-only access to the content-management system.

use thiserror::Error;

use crate::{
    content::{Asset, Entity, EntityId, SiteInfo, SiteOptions, Term},
    schema::{ContentTypeDef, FieldDefinition},
};

/// Content store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entity with this id.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No content type with this name.
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    /// The backing store failed.
    #[error("content store error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Where a field definition is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope<'a> {
    /// Top-level schema of the entity's content type.
    Entity(EntityId),
    /// Schema nested under the container field `key` of `content_type`.
    ///
    /// Container keys are only unique within one content type.
    Parent { content_type: &'a str, key: &'a str },
}

/// Read-only repository over the content-management system.
///
/// Calls returning language-dependent data take the language code
/// explicitly; `None` reads the canonical content.
pub trait ContentStore: Send + Sync {
    /// Fetch an entity as seen in `lang`.
    fn entity(&self, id: EntityId, lang: Option<&str>) -> Result<Entity>;

    /// All entities of a content type, in storage order.
    fn entities_by_type(&self, content_type: &str, lang: Option<&str>) -> Result<Vec<Entity>>;

    /// Schema of a content type.
    fn content_type(&self, name: &str) -> Result<ContentTypeDef>;

    /// Look up a field definition by name (entity scope) or by the key of
    /// the enclosing container (parent scope; `name` is then ignored and the
    /// container definition itself is returned).
    fn field_definition(&self, name: &str, scope: FieldScope<'_>) -> Result<Option<FieldDefinition>>;

    /// Fetch a media asset.
    fn asset(&self, id: EntityId) -> Option<Asset>;

    /// Fetch a taxonomy term.
    fn term(&self, taxonomy: &str, id: EntityId) -> Option<Term>;

    /// Site name, description and URLs.
    fn site_info(&self) -> SiteInfo;

    /// Header, footer and static translations for `lang`.
    fn site_options(&self, lang: Option<&str>) -> SiteOptions;

    /// The designated front page, if any.
    fn front_page(&self) -> Option<EntityId>;
}
