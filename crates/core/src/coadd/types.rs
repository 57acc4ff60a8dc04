//! Types for coadd handling.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

use crate::crossmatch::SkyCoords;

/// Spectrograph bands extracted by default.
pub const DEFAULT_BANDS: [&str; 3] = ["B", "R", "Z"];

static COADD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^coadd-([A-Za-z0-9_]+)-([A-Za-z0-9_]+)-([0-9]+)\.fits$")
        .unwrap_or_else(|e| unreachable!("invalid coadd name pattern: {e}"))
});

static COADD_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^coadd-.+\.fits$").unwrap_or_else(|e| unreachable!("invalid pattern: {e}"))
});

/// Errors that can occur while reading or writing coadd files.
#[derive(Debug, Error)]
pub enum CoaddError {
    /// Coadd file does not exist.
    #[error("coadd file not found: {0}")]
    NotFound(PathBuf),

    /// FITS-level failure.
    #[error("failed to read {path}: {source}")]
    Fits {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },

    /// A required HDU is absent.
    #[error("{path} has no '{hdu}' extension")]
    MissingHdu { path: PathBuf, hdu: String },

    /// The FIBERMAP lacks usable identifier or coordinate columns.
    #[error("{path}: FIBERMAP {detail}")]
    FiberMap { path: PathBuf, detail: String },

    /// None of the requested bands exist in the file.
    #[error("{path} contains none of the requested bands {bands:?}")]
    NoBands { path: PathBuf, bands: Vec<String> },

    /// An HDU's data has an unusable shape.
    #[error("{path}: '{hdu}' has unexpected shape ({detail})")]
    BadShape {
        path: PathBuf,
        hdu: String,
        detail: String,
    },

    /// HDF5-level failure writing the extracted output.
    #[error("failed to write {path}: {source}")]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },

    /// The trimmed output disagrees with the kept-row count.
    #[error("{path}: trimmed FIBERMAP has {actual} rows, expected {expected}")]
    RowCountMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// File name does not follow the coadd naming convention.
    #[error("'{0}' is not a coadd file name (expected coadd-<survey>-<program>-<pixel>.fits)")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The (survey, program, pixel) triple encoded in a coadd file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoaddName {
    pub survey: String,
    pub program: String,
    pub healpix: u64,
}

impl CoaddName {
    pub fn new(survey: impl Into<String>, program: impl Into<String>, healpix: u64) -> Self {
        Self {
            survey: survey.into(),
            program: program.into(),
            healpix,
        }
    }

    /// Deterministic file name: `coadd-<survey>-<program>-<pixel>.fits`.
    pub fn file_name(&self) -> String {
        format!("coadd-{}-{}-{}.fits", self.survey, self.program, self.healpix)
    }

    /// Parse a file name back into its components.
    pub fn parse(name: &str) -> Result<Self, CoaddError> {
        let caps = COADD_NAME
            .captures(name)
            .ok_or_else(|| CoaddError::InvalidName(name.to_string()))?;
        let healpix = caps[3]
            .parse::<u64>()
            .map_err(|_| CoaddError::InvalidName(name.to_string()))?;
        Ok(Self {
            survey: caps[1].to_string(),
            program: caps[2].to_string(),
            healpix,
        })
    }
}

/// Whether a file name looks like an arriving coadd (any `coadd-*.fits`,
/// excluding already-trimmed outputs).
pub(crate) fn is_coadd_file(name: &str) -> bool {
    COADD_FILE.is_match(name) && !name.ends_with(".trimmed.fits")
}

/// Identifier and coordinate table of a coadd.
#[derive(Debug, Clone)]
pub struct FiberMap {
    /// Target ids, when the file carries them.
    pub targetid: Option<Vec<i64>>,
    /// Per-row sky positions.
    pub coords: SkyCoords,
}

impl FiberMap {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Per-band spectra arrays. Flux is (targets, wavelengths); the optional
/// arrays share its shape, and the wavelength grid is 1-D.
#[derive(Debug, Clone)]
pub struct BandData {
    pub wavelength: Option<Vec<f32>>,
    pub flux: Array2<f32>,
    pub ivar: Option<Array2<f32>>,
    pub mask: Option<Array2<i32>>,
}

impl BandData {
    pub fn targets(&self) -> usize {
        self.flux.nrows()
    }
}

/// List arriving coadd files under a root, sorted by name.
pub(crate) fn sorted_coadd_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if is_coadd_file(name) && entry.path().is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}
