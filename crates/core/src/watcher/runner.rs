//! The watch loop.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::config::WatcherConfig;
use crate::catalog::{Catalog, CatalogColumns, CatalogError};
use crate::coadd::{list_coadd_files, trim_coadd, trimmed_path, CoaddError, TrimOptions};
use crate::crossmatch::SkyCoords;

/// Errors from the watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Watched directory does not exist.
    #[error("watch root not found: {0}")]
    RootNotFound(PathBuf),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Coadd(#[from] CoaddError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters accumulated over one watcher run.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatcherStats {
    /// Files trimmed successfully.
    pub trimmed: u64,
    /// Files moved aside in test mode.
    pub moved: u64,
    /// Files whose processing failed.
    pub failed: u64,
}

/// Directory watcher that trims arriving coadd files one at a time.
///
/// Construction validates everything the loop depends on — the watch root
/// and the catalog — so a bad catalog path fails here with a clear error
/// instead of crashing mid-run after files have started arriving.
#[derive(Debug)]
pub struct CoaddWatcher {
    root: PathBuf,
    catalog_coords: SkyCoords,
    trim_options: TrimOptions,
    config: WatcherConfig,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CoaddWatcher {
    /// Create a watcher: checks the watch root and loads the catalog up
    /// front.
    pub fn new(
        root: &Path,
        catalog_path: &Path,
        columns: &CatalogColumns,
        trim_options: TrimOptions,
        config: WatcherConfig,
    ) -> Result<Self, WatcherError> {
        if !root.is_dir() {
            return Err(WatcherError::RootNotFound(root.to_path_buf()));
        }

        let catalog = Catalog::load(catalog_path, columns)?;
        info!(
            catalog = %catalog_path.display(),
            rows = catalog.len(),
            root = %root.display(),
            "watcher validated inputs"
        );

        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            root: root.to_path_buf(),
            catalog_coords: catalog.coords(),
            trim_options,
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        })
    }

    /// Sender that stops the run loop when signalled.
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run the watch loop until a shutdown signal arrives.
    pub async fn run(&self) -> Result<WatcherStats, WatcherError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("watcher already running");
            return Ok(WatcherStats::default());
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut stats = WatcherStats::default();

        info!(root = %self.root.display(), poll_seconds = self.config.poll_seconds, "watch loop started");

        loop {
            if let Err(e) = self.scan_once(&mut seen, &mut stats).await {
                // A scan-level failure (e.g. the root disappeared) is fatal;
                // per-file failures are handled inside the scan.
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("watch loop received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(Duration::from_secs(self.config.poll_seconds)) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            trimmed = stats.trimmed,
            moved = stats.moved,
            failed = stats.failed,
            "watch loop stopped"
        );
        Ok(stats)
    }

    async fn scan_once(
        &self,
        seen: &mut HashSet<PathBuf>,
        stats: &mut WatcherStats,
    ) -> Result<(), WatcherError> {
        let files = list_coadd_files(&self.root)?;

        for path in files {
            if trimmed_path(&path).exists() {
                continue;
            }
            if seen.contains(&path) && !self.config.test_mode {
                continue;
            }
            if !self.old_enough(&path) {
                debug!(path = %path.display(), "file too young; waiting");
                continue;
            }

            if self.config.test_mode {
                match move_test_file(&path, &self.config.test_output_dir) {
                    Ok(target) => {
                        info!(from = %path.display(), to = %target.display(), "moved test file");
                        stats.moved += 1;
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "test-mode move failed");
                        stats.failed += 1;
                    }
                }
                seen.insert(path);
                continue;
            }

            let coords = self.catalog_coords.clone();
            let options = self.trim_options.clone();
            let trim_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                trim_coadd(&trim_path, &coords, &options)
            })
            .await;

            match result {
                Ok(Ok(summary)) => {
                    stats.trimmed += 1;
                    info!(
                        path = %path.display(),
                        kept = summary.kept,
                        coadd_rows = summary.coadd_rows,
                        "processed arrival"
                    );
                }
                Ok(Err(e)) => {
                    // One bad file must not stop the loop; it is remembered
                    // so the loop does not spin on it.
                    error!(path = %path.display(), error = %e, "failed to trim arrival");
                    stats.failed += 1;
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "trim task panicked");
                    stats.failed += 1;
                }
            }
            seen.insert(path);
        }

        Ok(())
    }

    fn old_enough(&self, path: &Path) -> bool {
        if self.config.min_age_seconds == 0 {
            return true;
        }
        let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age.as_secs() >= self.config.min_age_seconds,
            Err(_) => false,
        }
    }
}

fn move_test_file(path: &Path, test_output_dir: &Path) -> std::io::Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (stem, suffix) = match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name.as_str(), ""),
    };
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let target = test_output_dir.join(format!("{stem}_{timestamp}{suffix}"));

    std::fs::create_dir_all(test_output_dir)?;
    std::fs::rename(path, &target)?;
    Ok(target)
}
