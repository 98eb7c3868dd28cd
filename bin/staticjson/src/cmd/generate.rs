//! Generate command - exports the JSON documents once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr, bail};
use staticjson_generator::GenerationReport;

/// Run the generate command.
pub fn run(config_path: &Path, content: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?content, ?output, "Starting generation");

    let config = crate::load_config(config_path)?;
    let content = crate::content_path(&config, content);
    tracing::debug!(?config, "Loaded configuration");

    let generator = crate::generator(config, &content, output)?;
    let report = generator.run().wrap_err("Generation failed")?;

    print_report(&report);
    println!("  Duration:   {:.2}s", start.elapsed().as_secs_f64());
    println!();

    if !report.is_success() {
        let failed = report.languages.iter().filter(|l| !l.is_ok()).count();
        bail!("Generation failed for {failed} language(s)");
    }

    Ok(())
}

/// Print a generation report.
pub fn print_report(report: &GenerationReport) {
    println!();
    if report.disabled {
        println!("  Export is disabled; nothing generated.");
        return;
    }

    for lang in &report.languages {
        match (&lang.file, &lang.error) {
            (Some(file), _) => println!("  ✓ {:<6} {}", lang.code, file.display()),
            (None, Some(e)) => println!("  ✗ {:<6} {e}", lang.code),
            (None, None) => println!("  ✗ {:<6} not written", lang.code),
        }
        for skipped in &lang.skipped {
            println!("      ⚠ skipped entity {}: {}", skipped.id, skipped.reason);
        }
    }

    if let Some(config_file) = &report.config_file {
        println!("  ✓ {:<6} {}", "config", config_file.display());
    }

    for warning in &report.warnings {
        println!("  ⚠ {warning}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_site(dir: &Path) -> std::path::PathBuf {
        fs::write(
            dir.join("content.json"),
            r#"{
                "site": { "name": "Acme", "home_url": "https://acme.test" },
                "content_types": [{ "name": "page", "fields": [
                    { "key": "field_intro", "name": "intro", "type": "text" }
                ]}],
                "entities": [{ "id": 2, "type": "page", "slug": "about" }]
            }"#,
        )
        .unwrap();

        let config = dir.join("staticjson.toml");
        fs::write(
            &config,
            format!(
                "[export]\ncontent = {:?}\npost_types = [\"page\"]\npages = [2]\n",
                dir.join("content.json").display().to_string()
            ),
        )
        .unwrap();
        config
    }

    #[test]
    fn test_generate_writes_output() {
        let dir = TempDir::new().unwrap();
        let config = write_site(dir.path());
        let out = dir.path().join("out");

        run(&config, None, Some(&out)).unwrap();

        assert!(out.join("site-data.json").is_file());
        assert!(out.join("config.json").is_file());
    }

    #[test]
    fn test_generate_missing_config() {
        let dir = TempDir::new().unwrap();
        assert!(run(&dir.path().join("missing.toml"), None, None).is_err());
    }

    #[test]
    fn test_generate_missing_content() {
        let dir = TempDir::new().unwrap();
        let config = write_site(dir.path());
        let missing = dir.path().join("gone.json");
        assert!(run(&config, Some(&missing), Some(dir.path())).is_err());
    }
}
