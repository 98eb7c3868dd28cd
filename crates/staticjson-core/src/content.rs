//! Content items as exposed by the content store.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw field data of an entity, keyed by field name.
pub type FieldMap = Map<String, Value>;

/// Identifier of an entity, asset or term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Read an id from a raw value: a number, a numeric string, or an object
    /// carrying an `id`/`ID` member.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self),
            Value::String(s) => s.trim().parse().ok().map(Self),
            Value::Object(map) => map.get("id").or_else(|| map.get("ID")).and_then(Self::from_value),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Publication status of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Publish,
    Draft,
}

/// Search-engine overrides stored alongside an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
}

/// Per-language replacement values for an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityOverlay {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub seo: Option<SeoMeta>,
}

/// One content item: a page or an instance of a custom content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,

    /// Content type name.
    #[serde(rename = "type")]
    pub content_type: String,

    pub slug: String,

    #[serde(default)]
    pub title: String,

    /// Parent entity (pages only).
    #[serde(default)]
    pub parent: Option<EntityId>,

    /// Manual sort position.
    #[serde(default)]
    pub menu_order: i32,

    #[serde(default)]
    pub status: Status,

    /// Publication date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Raw field values.
    #[serde(default)]
    pub fields: FieldMap,

    #[serde(default)]
    pub seo: SeoMeta,

    /// Language code to overlay.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, EntityOverlay>,
}

impl Entity {
    /// Return this entity as seen in `lang`, applying its overlay if any.
    pub fn localized(&self, lang: Option<&str>) -> Self {
        let mut entity = self.clone();
        entity.translations.clear();

        let Some(overlay) = lang.and_then(|code| self.translations.get(code)) else {
            return entity;
        };

        if let Some(title) = &overlay.title {
            entity.title = title.clone();
        }
        if let Some(slug) = &overlay.slug {
            entity.slug = slug.clone();
        }
        if let Some(seo) = &overlay.seo {
            entity.seo = seo.clone();
        }
        for (name, value) in &overlay.fields {
            entity.fields.insert(name.clone(), value.clone());
        }
        entity
    }

    /// Whether this entity is published.
    pub fn is_published(&self) -> bool {
        self.status == Status::Publish
    }
}

/// A rendition of an image asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A media asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: EntityId,
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Alternative text stored in the asset metadata.
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Rendition name to rendition.
    #[serde(default)]
    pub sizes: BTreeMap<String, Rendition>,
}

impl Asset {
    /// The original rendition.
    pub fn original(&self) -> Rendition {
        Rendition {
            url: self.url.clone(),
            width: self.width,
            height: self.height,
        }
    }

    /// A named rendition, falling back to the original when the asset has no
    /// such size.
    pub fn rendition(&self, size: &str) -> Rendition {
        self.sizes.get(size).cloned().unwrap_or_else(|| self.original())
    }
}

/// A taxonomy term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: EntityId,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    /// Custom attributes attached to the term.
    #[serde(default)]
    pub fields: FieldMap,
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Public home URL of the site.
    pub home_url: String,
    /// URL of the content-management installation.
    #[serde(default)]
    pub site_url: String,
}

/// Source of a navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    #[default]
    Internal,
    External,
}

/// One navigation entry in the site header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderItem {
    #[serde(default)]
    pub link_source: LinkSource,
    pub title: String,
    #[serde(default)]
    pub internal_link: Option<EntityId>,
    #[serde(default)]
    pub external_link: Option<String>,
}

/// A static UI string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub key: String,
    pub text: String,
}

/// Site sections edited outside of any entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteOptions {
    #[serde(default)]
    pub header: Vec<HeaderItem>,
    #[serde(default)]
    pub footer: Value,
    #[serde(default)]
    pub translations: Vec<Translation>,
}
