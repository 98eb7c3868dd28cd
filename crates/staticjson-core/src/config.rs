//! Export configuration management.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    content::EntityId,
    error::{CoreError, Result},
    language::Language,
};

/// Main configuration structure for Static JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Output languages; empty disables multi-language output.
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,

    /// Extra entries merged into every document's `site_settings`.
    #[serde(default)]
    pub site_settings: Map<String, Value>,
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Whether generation runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the content dump read by the command line.
    #[serde(default = "default_content")]
    pub content: String,

    /// Directory receiving the data documents and `config.json`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Root of the downstream site generator project.
    #[serde(default)]
    pub base_dir: String,

    /// Directory the downstream generator writes HTML into.
    #[serde(default)]
    pub html_dir: String,

    /// Absolute public URL used for links; defaults to the store's home URL.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Exported content types.
    #[serde(default)]
    pub post_types: Vec<String>,

    /// Exported pages, in output order.
    #[serde(default)]
    pub pages: Vec<EntityId>,

    /// Template file extension used in `config.json`.
    #[serde(default = "default_template_ext")]
    pub template_ext: String,

    /// Name of the flexible-content discriminator.
    #[serde(default = "default_layout_key")]
    pub layout_key: String,

    /// Maximum nesting depth of the field walk.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Generate languages in parallel.
    #[serde(default)]
    pub parallel: bool,

    /// Image rendition emitted as `thumbnail`.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: String,
}

/// One configured output language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language code.
    pub code: String,

    /// Display name; defaults to the code.
    #[serde(default)]
    pub name: Option<String>,

    /// Routing prefix; defaults to empty for the first language and
    /// `/<code>` for the others.
    #[serde(default)]
    pub path: Option<String>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_content() -> String {
    "content.json".to_string()
}

fn default_output_dir() -> String {
    "static-json".to_string()
}

fn default_template_ext() -> String {
    "pug".to_string()
}

fn default_layout_key() -> String {
    "acf_fc_layout".to_string()
}

fn default_max_depth() -> usize {
    32
}

fn default_thumbnail_size() -> String {
    "medium".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content: default_content(),
            output_dir: default_output_dir(),
            base_dir: String::new(),
            html_dir: String::new(),
            public_url: None,
            post_types: Vec::new(),
            pages: Vec::new(),
            template_ext: default_template_ext(),
            layout_key: default_layout_key(),
            max_depth: default_max_depth(),
            parallel: false,
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, letting `STATICJSON__SECTION__KEY` environment
    /// variables override file values.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("STATICJSON").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.export.output_dir.is_empty() {
            return Err(CoreError::config("export.output_dir cannot be empty"));
        }

        if self.export.max_depth == 0 {
            return Err(CoreError::config("export.max_depth must be greater than 0"));
        }

        if self.export.layout_key.is_empty() {
            return Err(CoreError::config("export.layout_key cannot be empty"));
        }

        let mut codes = HashSet::new();
        let mut paths = HashSet::new();
        let mut files = HashSet::new();
        for lang in self.languages() {
            if lang.code.is_empty() {
                return Err(CoreError::config("language code cannot be empty"));
            }
            // The code becomes part of the data file name.
            if !lang
                .code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(CoreError::config(format!(
                    "invalid language code {:?}: only letters, digits, '-' and '_' are allowed",
                    lang.code
                )));
            }
            if !codes.insert(lang.code.clone()) {
                return Err(CoreError::config(format!(
                    "duplicate language code: {}",
                    lang.code
                )));
            }
            if !paths.insert(lang.path.clone()) {
                return Err(CoreError::config(format!(
                    "duplicate language path {:?} for {}",
                    lang.path, lang.code
                )));
            }
            if !files.insert(lang.file_name.clone()) {
                return Err(CoreError::config(format!(
                    "duplicate data file name: {}",
                    lang.file_name
                )));
            }
        }

        if self.export.base_dir.is_empty() {
            tracing::warn!("export.base_dir is empty; template paths will be relative");
        }

        Ok(())
    }

    /// Whether multi-language output is enabled.
    pub fn is_multilingual(&self) -> bool {
        !self.languages.is_empty()
    }

    /// Resolved output languages, default language first.
    pub fn languages(&self) -> Vec<Language> {
        if self.languages.is_empty() {
            return vec![Language::monolingual()];
        }

        self.languages
            .iter()
            .enumerate()
            .map(|(i, lang)| {
                let is_default = i == 0;
                let path = lang.path.clone().unwrap_or_else(|| {
                    if is_default {
                        String::new()
                    } else {
                        format!("/{}", lang.code)
                    }
                });

                Language {
                    code: lang.code.clone(),
                    name: lang.name.clone().unwrap_or_else(|| lang.code.clone()),
                    path: path.trim_end_matches('/').to_string(),
                    file_name: Language::data_file_for(&lang.code),
                    is_default,
                    multilingual: true,
                }
            })
            .collect()
    }

    /// Whether `post_types` includes `name`.
    pub fn exports_type(&self, name: &str) -> bool {
        self.export.post_types.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[export]
output_dir = "dist/json"
base_dir = "/srv/site/"
html_dir = "/srv/site/html/"
public_url = "https://acme.test"
post_types = ["page", "post", "product"]
pages = [2, 5, 9]
max_depth = 8
parallel = true

[[languages]]
code = "en"
name = "English"

[[languages]]
code = "fr"
name = "Français"

[[languages]]
code = "zh-hans"
name = "中文"
path = "/cn"

[site_settings]
phone = "555-0100"
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("staticjson.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.export.output_dir, "dist/json");
        assert_eq!(config.export.base_dir, "/srv/site/");
        assert_eq!(config.export.public_url.as_deref(), Some("https://acme.test"));
        assert_eq!(config.export.post_types, vec!["page", "post", "product"]);
        assert_eq!(config.export.pages, vec![EntityId(2), EntityId(5), EntityId(9)]);
        assert_eq!(config.export.max_depth, 8);
        assert!(config.export.parallel);
        assert_eq!(config.site_settings["phone"], "555-0100");
        assert!(config.exports_type("product"));
        assert!(!config.exports_type("event"));
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("staticjson.toml");
        std::fs::write(&config_path, "[export]\n").expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert!(config.export.enabled);
        assert_eq!(config.export.content, "content.json");
        assert_eq!(config.export.output_dir, "static-json");
        assert_eq!(config.export.template_ext, "pug");
        assert_eq!(config.export.layout_key, "acf_fc_layout");
        assert_eq!(config.export.max_depth, 32);
        assert_eq!(config.export.thumbnail_size, "medium");
        assert!(!config.export.parallel);
        assert!(!config.is_multilingual());
    }

    #[test]
    fn test_languages_resolution() {
        let config: Config = toml::from_str(&create_test_config()).expect("parse");
        let langs = config.languages();

        assert_eq!(langs.len(), 3);
        assert_eq!(langs[0].path, "");
        assert!(langs[0].is_default);
        assert_eq!(langs[1].path, "/fr");
        assert_eq!(langs[1].file_name, "site-data_fr.json");
        assert_eq!(langs[2].path, "/cn");
        assert_eq!(langs[2].store_code(), Some("zh-hans"));
    }

    #[test]
    fn test_monolingual_languages() {
        let config = Config::default();
        let langs = config.languages();
        assert_eq!(langs.len(), 1);
        assert_eq!(langs[0].file_name, "site-data.json");
        assert!(langs[0].store_code().is_none());
    }

    #[test]
    fn test_validation_duplicate_language() {
        let config: Config = toml::from_str(
            r#"
[[languages]]
code = "fr"

[[languages]]
code = "fr"
"#,
        )
        .expect("parse");

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate language code"));
    }

    #[test]
    fn test_validation_duplicate_path() {
        let config: Config = toml::from_str(
            r#"
[[languages]]
code = "en"

[[languages]]
code = "fr"
path = ""
"#,
        )
        .expect("parse");

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate language path"));
    }

    #[test]
    fn test_validation_rejects_path_like_codes() {
        for code in ["../etc", "en/gb", "fr\\be", "..", "de.json"] {
            let mut config = Config::default();
            config.languages = vec![LanguageConfig {
                code: code.to_string(),
                name: None,
                path: None,
            }];

            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("invalid language code"), "{code}");
        }

        let config: Config = toml::from_str(&create_test_config()).expect("parse");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_max_depth() {
        let mut config = Config::default();
        config.export.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/staticjson.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
