//! Types for the tile/pixel index.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public URL of the DESI DR1 tile/pixel index.
pub const TILEPIX_URL: &str =
    "https://data.desi.lbl.gov/public/dr1/spectro/redux/iron/healpix/tilepix.fits";

/// Errors that can occur while loading or filtering the index.
#[derive(Debug, Error)]
pub enum TilepixError {
    /// Download failed after all retries.
    #[error("failed to download tilepix index from {url} after {attempts} attempts: {detail}")]
    Download {
        url: String,
        attempts: u32,
        detail: String,
    },

    /// The file is not a valid index table. For downloads this usually
    /// means the server returned an error page instead of the FITS file.
    #[error("{path} is not a valid tilepix index ({detail})")]
    InvalidIndex { path: PathBuf, detail: String },

    /// A required column is absent.
    #[error("tilepix index {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// FITS-level failure.
    #[error("failed to read {path}: {source}")]
    Fits {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One coverage entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilepixRow {
    pub healpix: u64,
    pub survey: String,
    pub program: String,
}

/// Filter over index rows.
#[derive(Debug, Clone, Default)]
pub struct TilepixFilter {
    /// Surveys to keep; must be non-empty.
    pub surveys: Vec<String>,
    /// Programs to keep; empty keeps all.
    pub programs: Vec<String>,
    /// Pixel ids to keep; `None` keeps all.
    pub healpix: Option<BTreeSet<u64>>,
}

impl TilepixFilter {
    pub fn for_surveys(surveys: Vec<String>) -> Self {
        Self {
            surveys,
            ..Self::default()
        }
    }

    fn keeps(&self, row: &TilepixRow) -> bool {
        if !self.surveys.iter().any(|s| *s == row.survey) {
            return false;
        }
        if !self.programs.is_empty() && !self.programs.iter().any(|p| *p == row.program) {
            return false;
        }
        if let Some(pixels) = &self.healpix {
            if !pixels.contains(&row.healpix) {
                return false;
            }
        }
        true
    }
}

/// The loaded index.
#[derive(Debug, Clone, Default)]
pub struct TilepixIndex {
    rows: Vec<TilepixRow>,
}

impl TilepixIndex {
    pub fn new(rows: Vec<TilepixRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TilepixRow] {
        &self.rows
    }

    /// Apply a filter and dedup to unique (healpix, survey, program)
    /// combinations, sorted.
    pub fn filter(&self, filter: &TilepixFilter) -> TilepixIndex {
        let unique: BTreeSet<TilepixRow> = self
            .rows
            .iter()
            .filter(|row| filter.keeps(row))
            .cloned()
            .collect();
        TilepixIndex {
            rows: unique.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(healpix: u64, survey: &str, program: &str) -> TilepixRow {
        TilepixRow {
            healpix,
            survey: survey.to_string(),
            program: program.to_string(),
        }
    }

    fn sample_index() -> TilepixIndex {
        TilepixIndex::new(vec![
            row(26421, "main", "dark"),
            row(26421, "main", "dark"), // duplicate tile coverage
            row(26421, "main", "bright"),
            row(26421, "sv3", "dark"),
            row(7, "main", "dark"),
        ])
    }

    #[test]
    fn filter_by_survey_dedups() {
        let filtered = sample_index().filter(&TilepixFilter::for_surveys(vec!["main".into()]));
        assert_eq!(filtered.len(), 3);
        assert!(filtered.rows().iter().all(|r| r.survey == "main"));
    }

    #[test]
    fn filter_by_program() {
        let mut filter = TilepixFilter::for_surveys(vec!["main".into()]);
        filter.programs = vec!["bright".into()];
        let filtered = sample_index().filter(&filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].program, "bright");
    }

    #[test]
    fn filter_by_pixels() {
        let mut filter = TilepixFilter::for_surveys(vec!["main".into()]);
        filter.healpix = Some(BTreeSet::from([7]));
        let filtered = sample_index().filter(&filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].healpix, 7);
    }

    #[test]
    fn filtered_rows_are_sorted() {
        let filtered = sample_index().filter(&TilepixFilter::for_surveys(vec!["main".into()]));
        let pixels: Vec<u64> = filtered.rows().iter().map(|r| r.healpix).collect();
        assert_eq!(pixels, vec![7, 26421, 26421]);
    }
}
