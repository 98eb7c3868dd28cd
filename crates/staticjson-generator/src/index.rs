//! Build manifest (`config.json`) for the downstream site generator.

use std::path::Path;

use serde::Serialize;
use staticjson_core::{Config, ContentStore, Language};
use tracing::{debug, warn};

/// Manifest file name.
pub const CONFIG_FILE: &str = "config.json";

/// Slug under which the default post type is published.
pub const BLOG_SLUG: &str = "blog";

/// Kind of build index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Posts,
    Pages,
    Homepage,
}

/// One thing the downstream generator must build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    #[serde(rename = "type")]
    pub kind: IndexKind,
    pub map: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub template: String,
}

/// A language as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub name: String,
    pub slug: String,
    pub path: String,
    pub json_data_file: String,
}

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub base_dir: String,
    pub html_dir: String,
    pub languages: Vec<LanguageEntry>,
    pub indicies: Vec<IndexEntry>,
}

impl ConfigDocument {
    /// Build the manifest for `languages`, data files living in `output_dir`.
    pub fn build(
        config: &Config,
        store: &dyn ContentStore,
        languages: &[Language],
        output_dir: &Path,
    ) -> Self {
        let export = &config.export;
        let templates = format!("{}templates/", export.base_dir);
        let ext = &export.template_ext;

        let languages = languages
            .iter()
            .map(|lang| LanguageEntry {
                name: lang.name.clone(),
                slug: lang.code.clone(),
                path: lang.path.clone(),
                json_data_file: output_dir.join(&lang.file_name).display().to_string(),
            })
            .collect();

        let mut indicies: Vec<IndexEntry> = export
            .post_types
            .iter()
            .filter(|name| name.as_str() != "page")
            .map(|name| {
                let slug = if name == "post" { BLOG_SLUG } else { name.as_str() };
                IndexEntry {
                    kind: IndexKind::Posts,
                    map: Vec::new(),
                    slug: Some(slug.to_string()),
                    template: format!("{templates}{slug}/single.{ext}"),
                }
            })
            .collect();

        let front_page = store.front_page();
        for &id in &export.pages {
            if Some(id) == front_page {
                continue;
            }
            match store.entity(id, None) {
                Ok(page) => indicies.push(IndexEntry {
                    kind: IndexKind::Pages,
                    map: Vec::new(),
                    template: format!("{templates}{}.{ext}", page.slug),
                    slug: Some(page.slug),
                }),
                Err(e) => warn!(id = %id, error = %e, "page left out of build index"),
            }
        }

        indicies.push(IndexEntry {
            kind: IndexKind::Homepage,
            map: Vec::new(),
            slug: None,
            template: format!("{templates}index.{ext}"),
        });

        debug!(entries = indicies.len(), "built index");

        Self {
            base_dir: export.base_dir.clone(),
            html_dir: export.html_dir.clone(),
            languages,
            indicies,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use staticjson_core::{EntityId, FixtureStore};

    use super::*;

    fn store() -> FixtureStore {
        FixtureStore::from_value(json!({
            "front_page": 1,
            "content_types": [{ "name": "page" }],
            "entities": [
                { "id": 1, "type": "page", "slug": "home" },
                { "id": 2, "type": "page", "slug": "about" }
            ]
        }))
        .unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.export.base_dir = "/srv/site/".to_string();
        config.export.html_dir = "/srv/site/html/".to_string();
        config.export.post_types = vec!["page".into(), "post".into(), "product".into()];
        config.export.pages = vec![EntityId(1), EntityId(2), EntityId(3)];
        config
    }

    #[test]
    fn test_manifest_shape() {
        let doc = ConfigDocument::build(
            &config(),
            &store(),
            &[Language::monolingual()],
            Path::new("/out"),
        );

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "baseDir": "/srv/site/",
                "htmlDir": "/srv/site/html/",
                "languages": [
                    { "name": "English", "slug": "en", "path": "", "jsonDataFile": "/out/site-data.json" }
                ],
                "indicies": [
                    { "type": "POSTS", "map": [], "slug": "blog",
                      "template": "/srv/site/templates/blog/single.pug" },
                    { "type": "POSTS", "map": [], "slug": "product",
                      "template": "/srv/site/templates/product/single.pug" },
                    { "type": "PAGES", "map": [], "slug": "about",
                      "template": "/srv/site/templates/about.pug" },
                    { "type": "HOMEPAGE", "map": [],
                      "template": "/srv/site/templates/index.pug" }
                ]
            })
        );
    }

    #[test]
    fn test_template_extension() {
        let mut config = config();
        config.export.template_ext = "njk".to_string();
        config.export.post_types.clear();
        config.export.pages.clear();

        let doc = ConfigDocument::build(&config, &store(), &[], Path::new("out"));
        assert_eq!(doc.indicies.len(), 1);
        assert_eq!(doc.indicies[0].kind, IndexKind::Homepage);
        assert_eq!(doc.indicies[0].template, "/srv/site/templates/index.njk");
    }
}
