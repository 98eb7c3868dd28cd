//! Static JSON CLI Library
//!
//! Command implementations for the Static JSON exporter. They are exposed as
//! a library so the binary stays a thin argument parser.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (generate, watch, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use staticjson::cmd;
//!
//! cmd::generate::run(Path::new("staticjson.toml"), None, None).unwrap();
//! ```

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use staticjson_core::{Config, FixtureStore};
use staticjson_generator::{GenerationReport, Generator};

pub mod cmd;

pub use staticjson_core::ContentStore;
pub use staticjson_generator::CompletionHook;

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Load configuration, applying `STATICJSON__*` environment overrides.
pub fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        color_eyre::eyre::bail!("Configuration file not found: {}", config_path.display());
    }
    Config::load_with_env(config_path).wrap_err("Failed to load configuration")
}

/// Content dump path: the override, or `export.content`.
pub fn content_path(config: &Config, content: Option<&Path>) -> PathBuf {
    content
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.export.content))
}

/// Build a generator over the content dump at `content`.
pub fn generator(config: Config, content: &Path, output: Option<&Path>) -> Result<Generator> {
    let store = FixtureStore::load(content)
        .wrap_err_with(|| format!("Failed to load content dump {}", content.display()))?;

    let mut generator = Generator::new(config, store).with_hook(LogCompletion);
    if let Some(output) = output {
        generator = generator.with_output_dir(output);
    }
    Ok(generator)
}

/// Logs the "generation complete" signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCompletion;

impl CompletionHook for LogCompletion {
    fn on_complete(&self, report: &GenerationReport) {
        if report.disabled {
            tracing::info!("generation skipped");
            return;
        }
        tracing::info!(
            success = report.is_success(),
            files = report.files().count(),
            duration_ms = report.duration_ms,
            "generation finished"
        );
    }
}
