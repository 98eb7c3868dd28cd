//! Check command - validate configuration and content model

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use staticjson_core::{Config, ContentStore, FixtureStore};
use staticjson_generator::validate_content_model;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration, the content dump and its content model.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match crate::load_config(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e:#}"));
            println!("  ✗ Configuration invalid: {e:#}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking content dump...");
        let content = crate::content_path(cfg, None);
        match FixtureStore::load(&content) {
            Ok(store) => {
                println!("  ✓ Loaded {}", content.display());

                println!("\nChecking content model...");
                check_model(cfg, &store, &mut result);

                println!("\nChecking pages...");
                check_pages(cfg, &store, &mut result);
            }
            Err(e) => {
                result.add_error(format!("{}: {e}", content.display()));
                println!("  ✗ Content dump unreadable: {e}");
            }
        }
    }

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_model(config: &Config, store: &dyn ContentStore, result: &mut ValidationResult) {
    let check = validate_content_model(config, store);

    if check.is_valid() {
        println!("  ✓ Content model valid");
    } else {
        println!("  ✗ {} content model error(s)", check.errors.len());
    }

    for err in check.errors {
        result.add_error(err.to_string());
    }
    for warning in check.warnings {
        result.add_warning(warning);
    }
}

/// Configured pages must exist in the dump.
fn check_pages(config: &Config, store: &dyn ContentStore, result: &mut ValidationResult) {
    let mut missing = 0;

    for &id in &config.export.pages {
        if let Err(e) = store.entity(id, None) {
            result.add_warning(format!("Configured page {id}: {e}"));
            missing += 1;
        }
    }

    if missing == 0 {
        println!("  ✓ All {} configured pages found", config.export.pages.len());
    } else {
        println!("  ⚠ {missing} configured page(s) missing");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_site(dir: &Path, fields: &str, pages: &str) -> std::path::PathBuf {
        fs::write(
            dir.join("content.json"),
            format!(
                r#"{{
                    "content_types": [{{ "name": "page", "fields": {fields} }}],
                    "entities": [{{ "id": 2, "type": "page", "slug": "about" }}]
                }}"#
            ),
        )
        .unwrap();

        let config = dir.join("staticjson.toml");
        fs::write(
            &config,
            format!(
                "[export]\ncontent = {:?}\nbase_dir = \"/srv/\"\npost_types = [\"page\"]\npages = {pages}\n",
                dir.join("content.json").display().to_string()
            ),
        )
        .unwrap();
        config
    }

    #[test]
    fn test_check_passes() {
        let dir = TempDir::new().unwrap();
        let config = write_site(dir.path(), "[]", "[2]");
        assert!(run(&config, true).is_ok());
    }

    #[test]
    fn test_check_model_error() {
        let dir = TempDir::new().unwrap();
        let config = write_site(
            dir.path(),
            r#"[{ "key": "a", "name": "seo", "type": "text" }]"#,
            "[2]",
        );
        assert!(run(&config, false).is_err());
    }

    #[test]
    fn test_check_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let config = write_site(dir.path(), "[]", "[2, 3]");
        assert!(run(&config, false).is_ok());
        assert!(run(&config, true).is_err());
    }
}
