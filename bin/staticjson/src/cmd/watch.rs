//! Watch command - regenerate on every content save

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::eyre::{Result, WrapErr};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use staticjson_generator::GenerationReport;
use tokio::sync::mpsc;

use super::generate::print_report;

/// Debounce interval for file changes.
const DEBOUNCE_MS: u64 = 200;

/// Run the watch command.
///
/// Generates once, then again whenever the content dump or the
/// configuration file changes.
pub async fn run(config_path: &Path, content: Option<&Path>) -> Result<()> {
    tracing::info!(?config_path, ?content, "Starting watch mode");

    let config = crate::load_config(config_path)?;
    let content_path = crate::content_path(&config, content);
    let content_override = content.map(Path::to_path_buf);

    // Initial run
    tracing::info!("Running initial generation...");
    let report = regenerate(config_path.to_path_buf(), content_override.clone()).await?;
    print_report(&report);

    let watched = watched_names(&[config_path, &content_path]);

    // Setup file watcher
    let (tx, mut rx) = mpsc::channel::<()>(16);
    let watcher_tx = tx.clone();
    let filter = watched.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                // Only trigger on write/modify events
                if matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_))
                        | EventKind::Modify(ModifyKind::Name(_))
                        | EventKind::Create(_)
                ) && touches(&event.paths, &filter)
                {
                    let _ = watcher_tx.blocking_send(());
                }
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    // Editors often replace files, so watch the parent directories.
    for dir in watch_dirs(&[config_path, &content_path]) {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
        tracing::debug!(dir = %dir.display(), "Watching directory");
    }

    // Start regeneration task
    let task_config = config_path.to_path_buf();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Saves arriving during a run are queued and trigger the next one.
            settle(&mut rx, Duration::from_millis(DEBOUNCE_MS)).await;

            println!();
            println!("  Content change detected, regenerating...");

            match regenerate(task_config.clone(), content_override.clone()).await {
                Ok(report) => {
                    println!(
                        "  ✓ Wrote {} file(s) in {}ms",
                        report.files().count(),
                        report.duration_ms
                    );
                    if !report.is_success() {
                        print_report(&report);
                    }
                }
                Err(e) => {
                    tracing::error!("Regeneration failed: {e:#}");
                    eprintln!("  ✗ Regeneration failed: {e:#}");
                }
            }
        }
    });

    println!();
    println!("  Watching {} for changes", content_path.display());
    println!("  Press Ctrl+C to stop");
    println!();

    // Keep watcher alive
    let _watcher = watcher;
    drop(tx);

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl+C")?;

    Ok(())
}

/// Wait until no event has arrived for `window`.
///
/// Returns `false` if the channel closed meanwhile.
async fn settle(rx: &mut mpsc::Receiver<()>, window: Duration) -> bool {
    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(())) => continue,
            Ok(None) => return false,
            Err(_) => return true,
        }
    }
}

/// Reload configuration and content, then run once on the blocking pool.
async fn regenerate(config_path: PathBuf, content: Option<PathBuf>) -> Result<GenerationReport> {
    tokio::task::spawn_blocking(move || {
        let config = crate::load_config(&config_path)?;
        let content = crate::content_path(&config, content.as_deref());
        let generator = crate::generator(config, &content, None)?;
        generator.run().wrap_err("Generation failed")
    })
    .await
    .wrap_err("Generation task failed")?
}

fn watched_names(paths: &[&Path]) -> Vec<OsString> {
    paths
        .iter()
        .filter_map(|p| p.file_name().map(OsString::from))
        .collect()
}

fn watch_dirs(paths: &[&Path]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = paths
        .iter()
        .map(|p| match p.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

fn touches(paths: &[PathBuf], watched: &[OsString]) -> bool {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .any(|name| watched.iter().any(|w| w.as_os_str() == name))
}
