//! Count catalog matches against locally downloaded coadd files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use super::reader::{list_coadd_files, CoaddReader};
use super::types::CoaddError;
use crate::crossmatch::{match_indices, SkyCoords};

/// Options for the local counter.
#[derive(Debug, Clone)]
pub struct LocalCountOptions {
    pub max_arcsec: f64,
    /// Cap on coadd files processed, for quick checks.
    pub limit_files: Option<usize>,
}

impl Default for LocalCountOptions {
    fn default() -> Self {
        Self {
            max_arcsec: 1.0,
            limit_files: None,
        }
    }
}

/// Per-file counts.
#[derive(Debug, Clone)]
pub struct FileCount {
    pub path: PathBuf,
    pub targets: usize,
    pub catalog_matches: usize,
}

/// Aggregate report over all scanned files.
#[derive(Debug, Clone, Default)]
pub struct LocalCountReport {
    pub files: Vec<FileCount>,
    /// Distinct catalog rows matched by at least one file.
    pub unique_catalog_matches: usize,
}

/// For every coadd file under the given roots, count the catalog rows
/// within `max_arcsec` of any of its targets; the total dedups catalog rows
/// matched by more than one file.
pub fn count_local_matches(
    catalog_coords: &SkyCoords,
    roots: &[PathBuf],
    options: &LocalCountOptions,
) -> Result<LocalCountReport, CoaddError> {
    let mut files = Vec::new();
    for root in roots {
        files.extend(list_coadd_files(root)?);
    }
    if let Some(limit) = options.limit_files {
        files.truncate(limit);
    }

    info!(
        catalog_rows = catalog_coords.len(),
        files = files.len(),
        "counting local coadd matches"
    );

    let mut report = LocalCountReport::default();
    let mut matched: BTreeSet<usize> = BTreeSet::new();

    for path in files {
        let coadd_coords = read_target_coords(&path)?;
        let idx = match_indices(catalog_coords, &coadd_coords, options.max_arcsec);

        info!(
            file = %path.display(),
            targets = coadd_coords.len(),
            catalog_matches = idx.len(),
            max_arcsec = options.max_arcsec,
            "counted file"
        );

        matched.extend(idx.iter().copied());
        report.files.push(FileCount {
            path,
            targets: coadd_coords.len(),
            catalog_matches: idx.len(),
        });
    }

    report.unique_catalog_matches = matched.len();
    Ok(report)
}

fn read_target_coords(path: &Path) -> Result<SkyCoords, CoaddError> {
    let mut reader = CoaddReader::open(path)?;
    Ok(reader.fibermap()?.coords)
}
