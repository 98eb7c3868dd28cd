//! Generation runs.
//!
//! Coordinates one export: validation, per-language assembly and output,
//! then the build manifest and the completion signal.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use staticjson_core::{Config, ContentStore, CoreError, Language};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    dispatch::TransformRegistry,
    document::{Assembler, SkippedEntity},
    index::{CONFIG_FILE, ConfigDocument},
    links::LinkBuilder,
    serializer::SerializeOptions,
    validate::{ModelError, validate_content_model},
    writer::{OutputWriter, WriteError},
};

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] CoreError),

    /// Malformed content model.
    #[error("content model error: {0}")]
    Model(#[from] ModelError),

    /// The build manifest could not be written.
    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

/// Result type for generation runs.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Outcome of one language.
#[derive(Debug, Clone)]
pub struct LanguageOutcome {
    /// Language code.
    pub code: String,

    /// Written data file, if the write succeeded.
    pub file: Option<PathBuf>,

    /// Write failure message.
    pub error: Option<String>,

    /// Entities left out of the document.
    pub skipped: Vec<SkippedEntity>,
}

impl LanguageOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.file.is_some()
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Export was disabled; nothing was written.
    pub disabled: bool,

    /// Per-language outcomes, default language first.
    pub languages: Vec<LanguageOutcome>,

    /// Written `config.json`.
    pub config_file: Option<PathBuf>,

    /// Content model warnings.
    pub warnings: Vec<String>,

    /// Run duration in milliseconds.
    pub duration_ms: u64,
}

impl GenerationReport {
    /// Whether every language file was written.
    pub fn is_success(&self) -> bool {
        self.languages.iter().all(LanguageOutcome::is_ok)
    }

    /// Written files, data files first.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.languages
            .iter()
            .filter_map(|l| l.file.as_deref())
            .chain(self.config_file.as_deref())
    }
}

/// Receives the "generation complete" signal.
pub trait CompletionHook: Send + Sync {
    fn on_complete(&self, report: &GenerationReport);
}

impl<F> CompletionHook for F
where
    F: Fn(&GenerationReport) + Send + Sync,
{
    fn on_complete(&self, report: &GenerationReport) {
        self(report)
    }
}

/// Runs exports of one content store.
pub struct Generator {
    config: Config,
    store: Box<dyn ContentStore>,
    registry: TransformRegistry,
    output_dir: PathBuf,
    hooks: Vec<Box<dyn CompletionHook>>,
}

impl Generator {
    /// Create a generator writing to the configured output directory.
    #[must_use]
    pub fn new(config: Config, store: impl ContentStore + 'static) -> Self {
        let output_dir = PathBuf::from(&config.export.output_dir);
        Self {
            config,
            store: Box::new(store),
            registry: TransformRegistry::new(),
            output_dir,
            hooks: Vec::new(),
        }
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Use `registry` for custom field kinds.
    #[must_use]
    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a completion hook.
    #[must_use]
    pub fn with_hook(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute one generation run.
    pub fn run(&self) -> Result<GenerationReport> {
        let start = Instant::now();

        if !self.config.export.enabled {
            info!("export disabled; nothing to generate");
            let report = GenerationReport {
                disabled: true,
                ..GenerationReport::default()
            };
            self.complete(&report);
            return Ok(report);
        }

        // 1. Validate
        self.config.validate()?;
        let warnings = validate_content_model(&self.config, self.store.as_ref()).into_result()?;
        for warning in &warnings {
            warn!("{warning}");
        }

        let languages = self.config.languages();
        info!(
            output = %self.output_dir.display(),
            languages = languages.len(),
            parallel = self.config.export.parallel,
            "starting generation"
        );

        // 2. Documents
        let writer = OutputWriter::new(&self.output_dir);
        let links = LinkBuilder::new(self.public_url());
        let options = SerializeOptions {
            layout_key: self.config.export.layout_key.clone(),
            max_depth: self.config.export.max_depth,
            thumbnail_size: self.config.export.thumbnail_size.clone(),
        };

        let generate = |lang: &Language| self.generate_language(lang, &writer, &links, &options);
        let outcomes: Vec<_> = if self.config.export.parallel {
            languages.par_iter().map(generate).collect()
        } else {
            languages.iter().map(generate).collect()
        };

        // 3. Manifest
        let manifest = ConfigDocument::build(
            &self.config,
            self.store.as_ref(),
            &languages,
            &self.output_dir,
        );
        let config_file = writer.write(CONFIG_FILE, &manifest)?;

        let report = GenerationReport {
            disabled: false,
            languages: outcomes,
            config_file: Some(config_file),
            warnings,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            written = report.files().count(),
            failed = report.languages.iter().filter(|l| !l.is_ok()).count(),
            duration_ms = report.duration_ms,
            "generation complete"
        );

        self.complete(&report);
        Ok(report)
    }

    fn generate_language(
        &self,
        lang: &Language,
        writer: &OutputWriter,
        links: &LinkBuilder,
        options: &SerializeOptions,
    ) -> LanguageOutcome {
        debug!(language = %lang.code, file = %lang.file_name, "generating language");

        let assembly = Assembler::new(
            self.store.as_ref(),
            &self.config,
            &self.registry,
            lang,
            links,
            options,
        )
        .assemble();

        match writer.write(&lang.file_name, &assembly.document) {
            Ok(path) => LanguageOutcome {
                code: lang.code.clone(),
                file: Some(path),
                error: None,
                skipped: assembly.skipped,
            },
            Err(e) => {
                error!(language = %lang.code, error = %e, "failed to write document");
                LanguageOutcome {
                    code: lang.code.clone(),
                    file: None,
                    error: Some(e.to_string()),
                    skipped: assembly.skipped,
                }
            }
        }
    }

    fn public_url(&self) -> String {
        match &self.config.export.public_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => self.store.site_info().home_url,
        }
    }

    fn complete(&self, report: &GenerationReport) {
        for hook in &self.hooks {
            hook.on_complete(report);
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("output_dir", &self.output_dir)
            .field("registry", &self.registry)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;
    use staticjson_core::{FixtureStore, config::LanguageConfig};
    use tempfile::TempDir;

    use super::*;

    fn store() -> FixtureStore {
        FixtureStore::from_value(json!({
            "site": { "name": "Acme", "home_url": "https://acme.test" },
            "content_types": [{ "name": "page", "fields": [
                { "key": "field_intro", "name": "intro", "type": "text" }
            ]}],
            "entities": [{ "id": 2, "type": "page", "slug": "about", "fields": { "intro": "Hi" } }]
        }))
        .unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.export.post_types = vec!["page".to_string()];
        config.export.pages = vec![staticjson_core::EntityId(2)];
        config
    }

    #[test]
    fn test_run_writes_files() {
        let dir = TempDir::new().unwrap();
        let report = Generator::new(config(), store())
            .with_output_dir(dir.path())
            .run()
            .unwrap();

        assert!(report.is_success());
        assert!(dir.path().join("site-data.json").is_file());
        assert!(dir.path().join("config.json").is_file());
        assert_eq!(report.files().count(), 2);
    }

    #[test]
    fn test_disabled_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mut config = config();
        config.export.enabled = false;

        let report = Generator::new(config, store())
            .with_output_dir(&out)
            .run()
            .unwrap();

        assert!(report.disabled);
        assert!(!out.exists());
    }

    #[test]
    fn test_invalid_model_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::from_value(json!({
            "content_types": [{ "name": "page", "fields": [
                { "key": "a", "name": "id", "type": "text" }
            ]}]
        }))
        .unwrap();

        let err = Generator::new(config(), store)
            .with_output_dir(dir.path())
            .run()
            .unwrap_err();

        assert!(matches!(err, GenerateError::Model(ModelError::ReservedName { .. })));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_container_key_shared_by_two_types() {
        let dir = TempDir::new().unwrap();
        let rows = |sub: &str| {
            json!([{ "key": "field_rows", "name": "rows", "type": "repeater",
                     "sub_fields": [{ "key": format!("field_{sub}"), "name": sub, "type": "text" }] }])
        };
        let store = FixtureStore::from_value(json!({
            "content_types": [
                { "name": "product", "fields": rows("price") },
                { "name": "event", "fields": rows("venue") }
            ],
            "entities": [
                { "id": 1, "type": "product", "slug": "anvil", "fields": { "rows": [{ "price": "9" }] } },
                { "id": 2, "type": "event", "slug": "launch", "fields": { "rows": [{ "venue": "Hall" }] } }
            ]
        }))
        .unwrap();

        let mut config = Config::default();
        config.export.post_types = vec!["product".to_string(), "event".to_string()];

        let report = Generator::new(config, store)
            .with_output_dir(dir.path())
            .run()
            .unwrap();
        assert!(report.warnings.is_empty());

        let doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("site-data.json")).unwrap()).unwrap();
        assert_eq!(doc["product"][0]["rows"], json!([{ "price": "9" }]));
        assert_eq!(doc["event"][0]["rows"], json!([{ "venue": "Hall" }]));
    }

    #[test]
    fn test_type_named_like_a_section_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.export.post_types.push("pages".to_string());

        let err = Generator::new(config, store())
            .with_output_dir(dir.path())
            .run()
            .unwrap_err();

        assert!(matches!(err, GenerateError::Model(ModelError::SectionName { .. })));
        assert!(!dir.path().join("site-data.json").exists());
    }

    #[test]
    fn test_parallel_languages_and_hook() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.export.parallel = true;
        config.languages = ["en", "fr", "de"]
            .into_iter()
            .map(|code| LanguageConfig {
                code: code.to_string(),
                name: None,
                path: None,
            })
            .collect();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let report = Generator::new(config, store())
            .with_output_dir(dir.path())
            .with_hook(move |report: &GenerationReport| {
                assert!(report.is_success());
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .run()
            .unwrap();

        let codes: Vec<_> = report.languages.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["en", "fr", "de"]);
        for code in codes {
            assert!(dir.path().join(format!("site-data_{code}.json")).is_file());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
