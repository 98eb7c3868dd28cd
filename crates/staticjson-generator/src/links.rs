//! Absolute links to entities.

use staticjson_core::{ContentStore, Entity, EntityId, Language, StoreError};

/// Builds public URLs for entities in a given language.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    public_url: String,
}

impl LinkBuilder {
    /// Create a link builder rooted at `public_url`.
    #[must_use]
    pub fn new(public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Root URL of a language.
    pub fn language_root(&self, lang: &Language) -> String {
        format!("{}{}/", self.public_url, lang.path)
    }

    /// URL of an already loaded entity.
    pub fn entity_url(
        &self,
        entity: &Entity,
        rewrite_slug: Option<&str>,
        is_front_page: bool,
        lang: &Language,
    ) -> String {
        let root = self.language_root(lang);
        if is_front_page {
            return root;
        }

        match rewrite_slug.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            Some(prefix) => format!("{root}{prefix}/{}", entity.slug),
            None => format!("{root}{}", entity.slug),
        }
    }

    /// Look up an entity and build its URL.
    pub fn resolve(
        &self,
        store: &dyn ContentStore,
        id: EntityId,
        lang: &Language,
    ) -> Result<String, StoreError> {
        let entity = store.entity(id, lang.store_code())?;
        let rewrite_slug = store
            .content_type(&entity.content_type)
            .ok()
            .and_then(|def| def.rewrite_slug);
        let is_front_page = store.front_page() == Some(id);

        Ok(self.entity_url(&entity, rewrite_slug.as_deref(), is_front_page, lang))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use staticjson_core::FixtureStore;

    use super::*;

    fn store() -> FixtureStore {
        FixtureStore::from_value(json!({
            "site": { "name": "Acme", "home_url": "https://acme.test" },
            "front_page": 1,
            "content_types": [
                { "name": "page" },
                { "name": "product", "rewrite_slug": "products" }
            ],
            "entities": [
                { "id": 1, "type": "page", "slug": "home" },
                { "id": 2, "type": "page", "slug": "about",
                  "translations": { "fr": { "slug": "a-propos" } } },
                { "id": 3, "type": "product", "slug": "anvil" }
            ]
        }))
        .unwrap()
    }

    fn french() -> Language {
        Language {
            code: "fr".to_string(),
            name: "Français".to_string(),
            path: "/fr".to_string(),
            file_name: "site-data_fr.json".to_string(),
            is_default: false,
            multilingual: true,
        }
    }

    #[test]
    fn test_page_url() {
        let links = LinkBuilder::new("https://acme.test/");
        let url = links
            .resolve(&store(), EntityId(2), &Language::monolingual())
            .unwrap();
        assert_eq!(url, "https://acme.test/about");
    }

    #[test]
    fn test_typed_url_uses_rewrite_slug() {
        let links = LinkBuilder::new("https://acme.test");
        let url = links
            .resolve(&store(), EntityId(3), &Language::monolingual())
            .unwrap();
        assert_eq!(url, "https://acme.test/products/anvil");
    }

    #[test]
    fn test_front_page_url() {
        let links = LinkBuilder::new("https://acme.test");
        assert_eq!(
            links.resolve(&store(), EntityId(1), &french()).unwrap(),
            "https://acme.test/fr/"
        );
    }

    #[test]
    fn test_language_prefix_and_slug() {
        let links = LinkBuilder::new("https://acme.test");
        assert_eq!(
            links.resolve(&store(), EntityId(2), &french()).unwrap(),
            "https://acme.test/fr/a-propos"
        );
    }

    #[test]
    fn test_missing_entity() {
        let links = LinkBuilder::new("https://acme.test");
        assert!(
            links
                .resolve(&store(), EntityId(40), &Language::monolingual())
                .is_err()
        );
    }
}
