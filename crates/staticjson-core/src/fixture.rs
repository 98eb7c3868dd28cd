//! Content store backed by a JSON or YAML content dump.
//!
//! A dump is a single document holding everything the exporter reads from
//! the content-management system:
//!
//! ```yaml
//! site: { name: "Acme", home_url: "https://acme.test" }
//! front_page: 2
//! content_types:
//!   - name: page
//!     fields: [{ key: field_intro, name: intro, type: text }]
//! entities:
//!   - { id: 2, type: page, slug: home, title: Home }
//! assets: []
//! terms: []
//! options:
//!   default: { header: [], footer: null, translations: [] }
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    content::{Asset, Entity, EntityId, SiteInfo, SiteOptions, Term},
    error::{CoreError, Result},
    schema::{ContentTypeDef, FieldDefinition},
    store::{self, ContentStore, FieldScope, StoreError},
};

/// Key of the options used when a language has none of its own.
pub const DEFAULT_OPTIONS_KEY: &str = "default";

/// Serialized form of a content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentDump {
    #[serde(default)]
    pub site: SiteInfo,
    #[serde(default)]
    pub front_page: Option<EntityId>,
    #[serde(default)]
    pub content_types: Vec<ContentTypeDef>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub terms: Vec<Term>,
    /// Language code (or [`DEFAULT_OPTIONS_KEY`]) to site options.
    #[serde(default)]
    pub options: BTreeMap<String, SiteOptions>,
}

/// In-memory [`ContentStore`] over a [`ContentDump`].
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    dump: ContentDump,
    entities: HashMap<EntityId, usize>,
    assets: HashMap<EntityId, usize>,
}

impl FixtureStore {
    /// Build a store from a decoded dump.
    pub fn new(mut dump: ContentDump) -> Self {
        for def in &mut dump.content_types {
            def.link_parents();
        }

        let entities = dump
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        let assets = dump
            .assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();

        Self {
            dump,
            entities,
            assets,
        }
    }

    /// Load a dump from disk; the format is chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let dump: ContentDump = match ext.as_str() {
            "json" => serde_json::from_str(&raw)?,
            "yaml" | "yml" => serde_yaml::from_str(&raw)?,
            other => {
                return Err(CoreError::content(
                    path,
                    format!("unsupported content dump extension: {other:?}"),
                ));
            }
        };

        debug!(
            path = %path.display(),
            entities = dump.entities.len(),
            content_types = dump.content_types.len(),
            "loaded content dump"
        );
        Ok(Self::new(dump))
    }

    /// Decode a JSON value into a store.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(Self::new(serde_json::from_value(value)?))
    }

    /// The underlying dump.
    pub fn dump(&self) -> &ContentDump {
        &self.dump
    }

    fn type_def(&self, name: &str) -> Option<&ContentTypeDef> {
        self.dump.content_types.iter().find(|t| t.name == name)
    }

    fn raw_entity(&self, id: EntityId) -> store::Result<&Entity> {
        self.entities
            .get(&id)
            .map(|&i| &self.dump.entities[i])
            .ok_or(StoreError::EntityNotFound(id))
    }
}

impl ContentStore for FixtureStore {
    fn entity(&self, id: EntityId, lang: Option<&str>) -> store::Result<Entity> {
        self.raw_entity(id).map(|e| e.localized(lang))
    }

    fn entities_by_type(&self, content_type: &str, lang: Option<&str>) -> store::Result<Vec<Entity>> {
        if self.type_def(content_type).is_none() {
            return Err(StoreError::UnknownContentType(content_type.to_string()));
        }

        Ok(self
            .dump
            .entities
            .iter()
            .filter(|e| e.content_type == content_type)
            .map(|e| e.localized(lang))
            .collect())
    }

    fn content_type(&self, name: &str) -> store::Result<ContentTypeDef> {
        self.type_def(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownContentType(name.to_string()))
    }

    fn field_definition(
        &self,
        name: &str,
        scope: FieldScope<'_>,
    ) -> store::Result<Option<FieldDefinition>> {
        match scope {
            FieldScope::Entity(id) => {
                let entity = self.raw_entity(id)?;
                let def = self.content_type(&entity.content_type)?;
                Ok(def.field(name).cloned())
            }
            FieldScope::Parent { content_type, key } => {
                let def = self
                    .type_def(content_type)
                    .ok_or_else(|| StoreError::UnknownContentType(content_type.to_string()))?;
                Ok(def.find_by_key(key).cloned())
            }
        }
    }

    fn asset(&self, id: EntityId) -> Option<Asset> {
        self.assets.get(&id).map(|&i| self.dump.assets[i].clone())
    }

    fn term(&self, taxonomy: &str, id: EntityId) -> Option<Term> {
        self.dump
            .terms
            .iter()
            .find(|t| t.id == id && t.taxonomy == taxonomy)
            .cloned()
    }

    fn site_info(&self) -> SiteInfo {
        self.dump.site.clone()
    }

    fn site_options(&self, lang: Option<&str>) -> SiteOptions {
        lang.and_then(|code| self.dump.options.get(code))
            .or_else(|| self.dump.options.get(DEFAULT_OPTIONS_KEY))
            .cloned()
            .unwrap_or_default()
    }

    fn front_page(&self) -> Option<EntityId> {
        self.dump.front_page
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> FixtureStore {
        FixtureStore::from_value(json!({
            "site": { "name": "Acme", "home_url": "https://acme.test" },
            "front_page": 1,
            "content_types": [
                {
                    "name": "page",
                    "fields": [
                        { "key": "field_intro", "name": "intro", "type": "text" },
                        {
                            "key": "field_faq",
                            "name": "faq",
                            "type": "repeater",
                            "sub_fields": [
                                { "key": "field_q", "name": "question", "type": "text" }
                            ]
                        }
                    ]
                },
                { "name": "product", "rewrite_slug": "products" }
            ],
            "entities": [
                { "id": 1, "type": "page", "slug": "home" },
                { "id": 2, "type": "product", "slug": "anvil" },
                { "id": 3, "type": "product", "slug": "rocket", "status": "draft" }
            ],
            "terms": [
                { "id": 7, "taxonomy": "category", "name": "Tools", "slug": "tools" }
            ],
            "options": {
                "default": { "translations": [{ "key": "more", "text": "More" }] },
                "fr": { "translations": [{ "key": "more", "text": "Plus" }] }
            }
        }))
        .expect("valid dump")
    }

    #[test]
    fn test_entity_lookup() {
        let store = store();
        assert_eq!(store.entity(EntityId(2), None).unwrap().slug, "anvil");
        assert!(matches!(
            store.entity(EntityId(99), None),
            Err(StoreError::EntityNotFound(EntityId(99)))
        ));
    }

    #[test]
    fn test_entities_by_type() {
        let store = store();
        let products = store.entities_by_type("product", None).unwrap();
        assert_eq!(products.len(), 2);
        assert!(matches!(
            store.entities_by_type("event", None),
            Err(StoreError::UnknownContentType(_))
        ));
    }

    #[test]
    fn test_field_definition_scopes() {
        let store = store();
        let intro = store
            .field_definition("intro", FieldScope::Entity(EntityId(1)))
            .unwrap()
            .expect("top-level field");
        assert_eq!(intro.key, "field_intro");

        let faq = store
            .field_definition(
                "question",
                FieldScope::Parent {
                    content_type: "page",
                    key: "field_faq",
                },
            )
            .unwrap()
            .expect("container");
        assert_eq!(faq.name, "faq");
        assert!(faq.sub_field("question").is_some());
        assert_eq!(
            faq.sub_field("question").unwrap().parent_key.as_deref(),
            Some("field_faq")
        );

        assert!(
            store
                .field_definition("missing", FieldScope::Entity(EntityId(1)))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_parent_scope_is_per_content_type() {
        let rows = |sub: &str| {
            json!([{ "key": "field_rows", "name": "rows", "type": "repeater",
                     "sub_fields": [{ "key": format!("field_{sub}"), "name": sub, "type": "text" }] }])
        };
        let store = FixtureStore::from_value(json!({
            "content_types": [
                { "name": "product", "fields": rows("price") },
                { "name": "event", "fields": rows("venue") }
            ]
        }))
        .unwrap();

        let lookup = |content_type: &str| {
            store
                .field_definition(
                    "",
                    FieldScope::Parent {
                        content_type,
                        key: "field_rows",
                    },
                )
                .unwrap()
                .expect("container")
        };
        assert!(lookup("event").sub_field("venue").is_some());
        assert!(lookup("product").sub_field("price").is_some());
        assert!(matches!(
            store.field_definition(
                "",
                FieldScope::Parent {
                    content_type: "news",
                    key: "field_rows"
                }
            ),
            Err(StoreError::UnknownContentType(_))
        ));
    }

    #[test]
    fn test_site_options_fallback() {
        let store = store();
        assert_eq!(store.site_options(Some("fr")).translations[0].text, "Plus");
        assert_eq!(store.site_options(Some("de")).translations[0].text, "More");
        assert_eq!(store.site_options(None).translations[0].text, "More");
    }

    #[test]
    fn test_term_lookup() {
        let store = store();
        assert_eq!(store.term("category", EntityId(7)).unwrap().name, "Tools");
        assert!(store.term("post_tag", EntityId(7)).is_none());
    }

    #[test]
    fn test_load_yaml_dump() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("content.yaml");
        std::fs::write(
            &path,
            r#"
site:
  name: Acme
  home_url: https://acme.test
content_types:
  - name: page
entities:
  - { id: 5, type: page, slug: contact, title: Contact }
"#,
        )
        .expect("write");

        let store = FixtureStore::load(&path).expect("load dump");
        assert_eq!(store.site_info().name, "Acme");
        assert_eq!(store.entity(EntityId(5), None).unwrap().title, "Contact");
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("content.xml");
        std::fs::write(&path, "<content/>").expect("write");

        let err = FixtureStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported content dump extension"));
    }
}
