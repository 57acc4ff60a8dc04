//! Types for catalog handling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::healpix::PixelScheme;

/// Errors that can occur while reading or rewriting a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file does not exist.
    #[error("catalog file not found: {0}")]
    NotFound(PathBuf),

    /// CSV-level failure (malformed record, unreadable file).
    #[error("failed to read catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header.
    #[error("catalog {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell could not be parsed as the expected type.
    #[error("catalog {path} row {row}: cannot parse '{column}' value '{value}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    /// The catalog's pixel column does not agree with recomputation under
    /// the pinned scheme.
    #[error(
        "catalog pixel ids inconsistent with {scheme}: match rate {match_rate:.6} \
         below threshold {threshold}"
    )]
    SchemeMismatch {
        scheme: PixelScheme,
        match_rate: f64,
        threshold: f64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column names used to interpret a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogColumns {
    /// Right ascension column (degrees).
    #[serde(default = "default_ra_column")]
    pub ra: String,
    /// Declination column (degrees).
    #[serde(default = "default_dec_column")]
    pub dec: String,
    /// Coarse pixel id column.
    #[serde(default = "default_healpix_column")]
    pub healpix: String,
}

fn default_ra_column() -> String {
    "RA_DESI".to_string()
}

fn default_dec_column() -> String {
    "DEC_DESI".to_string()
}

fn default_healpix_column() -> String {
    "healpix".to_string()
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            ra: default_ra_column(),
            dec: default_dec_column(),
            healpix: default_healpix_column(),
        }
    }
}
