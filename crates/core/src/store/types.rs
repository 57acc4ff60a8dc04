//! Error types for the per-pixel store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while accessing the per-pixel match store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store root directory does not exist.
    #[error("match store root not found: {0}")]
    RootNotFound(PathBuf),

    /// No store file exists for an explicitly requested pixel.
    #[error("no match file for pixel {pixel} (expected {path})")]
    PixelNotFound { pixel: u64, path: PathBuf },

    /// HDF5-level failure.
    #[error("failed to access {path}: {source}")]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },

    /// A required dataset is absent from a store file.
    #[error("{path} has no '{dataset}' dataset")]
    MissingDataset { path: PathBuf, dataset: String },

    /// RA/Dec datasets disagree on row count.
    #[error("{path}: RA and Dec datasets have different lengths ({ra_len} vs {dec_len})")]
    LengthMismatch {
        path: PathBuf,
        ra_len: usize,
        dec_len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
