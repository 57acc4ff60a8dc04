//! One-shot batch processing and watcher test-file generation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use super::runner::WatcherError;
use crate::coadd::{list_coadd_files, trim_coadd, trimmed_path, TrimOptions, TrimSummary};
use crate::crossmatch::SkyCoords;

/// Result of a batch pass.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: Vec<TrimSummary>,
    /// Files skipped because a trimmed output already exists.
    pub skipped: usize,
}

/// Trim every coadd file under `root` once, in sorted order.
///
/// An empty root is reported, not an error; a trim failure aborts the batch
/// so it can be diagnosed rather than buried in a long run.
pub fn process_batch(
    root: &Path,
    catalog_coords: &SkyCoords,
    options: &TrimOptions,
) -> Result<BatchSummary, WatcherError> {
    let files = list_coadd_files(root)?;
    if files.is_empty() {
        warn!(root = %root.display(), "no coadd files found");
        return Ok(BatchSummary::default());
    }

    let mut summary = BatchSummary::default();
    for path in files {
        if trimmed_path(&path).exists() {
            summary.skipped += 1;
            continue;
        }
        summary.processed.push(trim_coadd(&path, catalog_coords, options)?);
    }

    info!(
        root = %root.display(),
        processed = summary.processed.len(),
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(summary)
}

/// Write dummy arrivals for exercising the watcher in test mode.
pub async fn generate_test_files(
    root: &Path,
    count: u32,
    interval: Duration,
) -> Result<Vec<PathBuf>, WatcherError> {
    std::fs::create_dir_all(root)?;

    let mut written = Vec::with_capacity(count as usize);
    for i in 0..count {
        let path = root.join(format!("coadd-test-{i}.fits"));
        std::fs::write(&path, format!("dummy {i}\n"))?;
        info!(path = %path.display(), "created test file");
        written.push(path);

        if i + 1 < count && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(written)
}
