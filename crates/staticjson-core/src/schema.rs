//! Field schema: the content model describing how raw field data is shaped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a field as declared by the content model.
///
/// The built-in kinds have dedicated transforms. Any other kind name is kept
/// as [`FieldKind::Custom`] and resolved against the registered transforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Text,
    Repeater,
    FlexibleContent,
    Image,
    File,
    Url,
    Taxonomy,
    Gallery,
    PostObject,
    Seo,
    /// A kind with no built-in transform.
    Custom(String),
}

impl FieldKind {
    /// Names of every built-in kind.
    pub const BUILTIN_NAMES: [&'static str; 10] = [
        "text",
        "repeater",
        "flexible_content",
        "image",
        "file",
        "url",
        "taxonomy",
        "gallery",
        "post_object",
        "seo",
    ];

    /// Parse a kind from its content-model name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            "repeater" => Self::Repeater,
            "flexible_content" => Self::FlexibleContent,
            "image" => Self::Image,
            "file" => Self::File,
            "url" => Self::Url,
            "taxonomy" => Self::Taxonomy,
            "gallery" => Self::Gallery,
            "post_object" => Self::PostObject,
            "seo" => Self::Seo,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Content-model name of this kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Repeater => "repeater",
            Self::FlexibleContent => "flexible_content",
            Self::Image => "image",
            Self::File => "file",
            Self::Url => "url",
            Self::Taxonomy => "taxonomy",
            Self::Gallery => "gallery",
            Self::PostObject => "post_object",
            Self::Seo => "seo",
            Self::Custom(name) => name,
        }
    }

    /// Whether values of this kind are ordered lists of nested field sets.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Repeater | Self::FlexibleContent)
    }

    /// Whether `name` is one of the built-in kind names.
    pub fn is_builtin_name(name: &str) -> bool {
        Self::BUILTIN_NAMES.contains(&name)
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<FieldKind> for String {
    fn from(value: FieldKind) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Stable field key (e.g. `field_5a1b`), used to look up nested schemas.
    #[serde(default)]
    pub key: String,

    /// Field name as it appears in raw data and in the output.
    pub name: String,

    /// Field kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Key of the enclosing container field, if nested.
    #[serde(default)]
    pub parent_key: Option<String>,

    /// Ordered sub-fields (repeater only).
    #[serde(default)]
    pub sub_fields: Vec<FieldDefinition>,

    /// Named layout variants (flexible content only).
    #[serde(default)]
    pub layouts: Vec<Layout>,

    /// Taxonomy queried by taxonomy fields.
    #[serde(default)]
    pub taxonomy: Option<String>,
}

impl FieldDefinition {
    /// Create a definition with no nested schema.
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind,
            parent_key: None,
            sub_fields: Vec::new(),
            layouts: Vec::new(),
            taxonomy: None,
        }
    }

    /// Find the layout declared under `name`.
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.name == name)
    }

    /// Find a direct sub-field by name.
    pub fn sub_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.sub_fields.iter().find(|field| field.name == name)
    }

    /// Depth-first search for a nested definition by key, including `self`.
    pub fn find_by_key(&self, key: &str) -> Option<&FieldDefinition> {
        if self.key == key {
            return Some(self);
        }
        self.sub_fields
            .iter()
            .chain(self.layouts.iter().flat_map(|layout| layout.sub_fields.iter()))
            .find_map(|field| field.find_by_key(key))
    }

    /// Point every nested definition's `parent_key` at its container.
    pub fn link_children(&mut self) {
        let key = self.key.clone();
        let children = self
            .sub_fields
            .iter_mut()
            .chain(self.layouts.iter_mut().flat_map(|layout| layout.sub_fields.iter_mut()));

        for child in children {
            child.parent_key = Some(key.clone());
            child.link_children();
        }
    }
}

/// One variant of a flexible-content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Layout name, matched against the discriminator value.
    pub name: String,

    /// Ordered fields of this variant.
    #[serde(default)]
    pub sub_fields: Vec<FieldDefinition>,
}

/// Top-level schema of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDef {
    /// Content type name (e.g. `page`, `product`).
    pub name: String,

    /// URL segment for entities of this type; `None` for pages.
    #[serde(default)]
    pub rewrite_slug: Option<String>,

    /// Ordered top-level fields.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ContentTypeDef {
    /// Find a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Search every nested definition of this type for `key`.
    pub fn find_by_key(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find_map(|field| field.find_by_key(key))
    }

    /// Fill in the `parent_key` back-references of nested definitions.
    pub fn link_parents(&mut self) {
        for field in &mut self.fields {
            field.parent_key = None;
            field.link_children();
        }
    }
}
