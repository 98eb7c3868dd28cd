//! Per-language document assembly.
//!
//! Combines serialized pages and content-type collections with the
//! site-wide sections into one [`Document`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value, json};
use staticjson_core::{
    Config, ContentStore, Entity, EntityId, Language, content::LinkSource,
};
use tracing::{debug, info, warn};

use crate::{
    dispatch::TransformRegistry,
    links::LinkBuilder,
    serializer::{SerializeOptions, SerializedNode, Serializer},
};

/// Content types exported through `pages` or not at all.
pub const EXCLUDED_TYPES: [&str; 2] = ["page", "post"];

/// Fixed top-level sections; content type arrays share their namespace.
pub const SECTION_KEYS: [&str; 5] = ["site_settings", "header", "footer", "pages", "translations"];

/// The complete export of one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub site_settings: Map<String, Value>,
    pub header: Vec<HeaderLink>,
    pub footer: Value,
    /// Page slug to page node.
    pub pages: Map<String, Value>,
    /// Translation key to text.
    pub translations: Map<String, Value>,
    /// Content type name to its serialized entities.
    #[serde(flatten)]
    pub content_types: Map<String, Value>,
}

/// A resolved header navigation entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderLink {
    #[serde(rename = "type")]
    pub link_type: LinkSource,
    pub title: String,
    pub url: Option<String>,
}

/// An entity left out of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub id: EntityId,
    pub reason: String,
}

/// Result of assembling one document.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub document: Document,
    pub skipped: Vec<SkippedEntity>,
}

/// Builds the document of one language.
pub struct Assembler<'a> {
    store: &'a dyn ContentStore,
    config: &'a Config,
    language: &'a Language,
    links: &'a LinkBuilder,
    serializer: Serializer<'a>,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn ContentStore,
        config: &'a Config,
        registry: &'a TransformRegistry,
        language: &'a Language,
        links: &'a LinkBuilder,
        options: &'a SerializeOptions,
    ) -> Self {
        Self {
            store,
            config,
            language,
            links,
            serializer: Serializer::new(store, registry, language, links, options),
        }
    }

    /// Assemble the full document.
    pub fn assemble(&self) -> Assembly {
        let mut skipped = Vec::new();

        let document = Document {
            site_settings: self.site_settings(),
            header: self.header(),
            footer: self.store.site_options(self.language.store_code()).footer,
            pages: self.pages(&mut skipped),
            translations: self.translations(),
            content_types: self.content_types(&mut skipped),
        };

        info!(
            language = %self.language.code,
            pages = document.pages.len(),
            content_types = document.content_types.len(),
            skipped = skipped.len(),
            "assembled document"
        );

        Assembly { document, skipped }
    }

    /// Site name, description and URLs.
    pub fn site_settings(&self) -> Map<String, Value> {
        let info = self.store.site_info();
        let homepage_url = format!("{}{}", info.home_url.trim_end_matches('/'), self.language.path);

        let mut settings = Map::new();
        settings.insert("name".to_string(), json!(info.name));
        settings.insert("description".to_string(), json!(info.description));
        settings.insert("homepage_url".to_string(), json!(homepage_url));
        settings.insert("site_url".to_string(), json!(info.site_url));
        settings.extend(self.config.site_settings.clone());
        settings
    }

    /// Header navigation with resolved URLs.
    pub fn header(&self) -> Vec<HeaderLink> {
        let options = self.store.site_options(self.language.store_code());

        options
            .header
            .into_iter()
            .map(|item| {
                let url = if let Some(id) = item.internal_link {
                    match self.links.resolve(self.store, id, self.language) {
                        Ok(url) => Some(url),
                        Err(e) => {
                            warn!(title = %item.title, id = %id, error = %e, "unresolved header link");
                            None
                        }
                    }
                } else {
                    item.external_link.filter(|link| !link.is_empty())
                };

                HeaderLink {
                    link_type: item.link_source,
                    title: item.title,
                    url,
                }
            })
            .collect()
    }

    /// Static translations keyed by translation key.
    pub fn translations(&self) -> Map<String, Value> {
        self.store
            .site_options(self.language.store_code())
            .translations
            .into_iter()
            .map(|t| (t.key, Value::String(t.text)))
            .collect()
    }

    fn page_node(&self, id: EntityId, skipped: &mut Vec<SkippedEntity>) -> Option<(Entity, SerializedNode)> {
        let entity = match self.store.entity(id, self.language.store_code()) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(id = %id, error = %e, "skipping page");
                skipped.push(SkippedEntity {
                    id,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        match self.serializer.serialize_entity(&entity) {
            Ok(node) => Some((entity, node)),
            Err(e) => {
                warn!(id = %id, slug = %entity.slug, error = %e, "skipping page");
                skipped.push(SkippedEntity {
                    id,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Configured pages keyed by slug, children nested under `subpages`.
    pub fn pages(&self, skipped: &mut Vec<SkippedEntity>) -> Map<String, Value> {
        let front_page = self.store.front_page();
        let mut pages = Map::new();
        let mut tracked: HashMap<EntityId, String> = HashMap::new();
        let mut children = Vec::new();

        for &id in &self.config.export.pages {
            if Some(id) == front_page {
                debug!(id = %id, "front page excluded from pages");
                continue;
            }

            let Some((entity, node)) = self.page_node(id, skipped) else {
                continue;
            };

            if entity.parent.is_some() {
                children.push((entity, node));
            } else {
                self.insert_top_level(&mut pages, &mut tracked, &entity, node);
            }
        }

        for (entity, node) in children {
            match self.tracked_ancestor(&entity, &tracked) {
                Some(slug) => {
                    if let Some(Value::Array(subpages)) = pages
                        .get_mut(&slug)
                        .and_then(|parent| parent.get_mut("subpages"))
                    {
                        subpages.push(Value::Object(node));
                    }
                }
                None => {
                    debug!(id = %entity.id, "no exported ancestor; page kept at top level");
                    self.insert_top_level(&mut pages, &mut tracked, &entity, node);
                }
            }
        }

        pages
    }

    fn insert_top_level(
        &self,
        pages: &mut Map<String, Value>,
        tracked: &mut HashMap<EntityId, String>,
        entity: &Entity,
        mut node: SerializedNode,
    ) {
        node.insert("subpages".to_string(), Value::Array(Vec::new()));
        if pages.contains_key(&entity.slug) {
            warn!(id = %entity.id, slug = %entity.slug, "duplicate page slug replaces earlier page");
        }
        tracked.insert(entity.id, entity.slug.clone());
        pages.insert(entity.slug.clone(), Value::Object(node));
    }

    /// Slug of the nearest ancestor exported at the top level.
    fn tracked_ancestor(&self, entity: &Entity, tracked: &HashMap<EntityId, String>) -> Option<String> {
        let mut seen = HashSet::new();
        let mut current = entity.parent;

        while let Some(id) = current {
            if let Some(slug) = tracked.get(&id) {
                return Some(slug.clone());
            }
            if !seen.insert(id) {
                break;
            }
            current = self
                .store
                .entity(id, self.language.store_code())
                .ok()
                .and_then(|parent| parent.parent);
        }

        None
    }

    /// One array per configured content type other than pages and posts.
    pub fn content_types(&self, skipped: &mut Vec<SkippedEntity>) -> Map<String, Value> {
        let mut types = Map::new();

        for name in &self.config.export.post_types {
            if EXCLUDED_TYPES.contains(&name.as_str()) {
                continue;
            }

            let entities = match self.store.entities_by_type(name, self.language.store_code()) {
                Ok(entities) => entities,
                Err(e) => {
                    warn!(content_type = %name, error = %e, "content type unavailable");
                    Vec::new()
                }
            };

            types.insert(name.clone(), Value::Array(self.collection(entities, skipped)));
        }

        types
    }

    fn collection(&self, mut entities: Vec<Entity>, skipped: &mut Vec<SkippedEntity>) -> Vec<Value> {
        entities.retain(Entity::is_published);
        entities.sort_by(|a, b| {
            a.menu_order
                .cmp(&b.menu_order)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.id.cmp(&b.id))
        });

        entities
            .iter()
            .filter_map(|entity| match self.serializer.serialize_entity(entity) {
                Ok(node) => Some(Value::Object(node)),
                Err(e) => {
                    warn!(id = %entity.id, content_type = %entity.content_type, error = %e, "skipping entity");
                    skipped.push(SkippedEntity {
                        id: entity.id,
                        reason: e.to_string(),
                    });
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Assembler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("language", &self.language.code)
            .finish_non_exhaustive()
    }
}
