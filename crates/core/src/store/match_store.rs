//! Filesystem-backed per-pixel match store.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::StoreError;
use crate::crossmatch::SkyCoords;

/// File name of the per-pixel match file inside each pixel directory.
pub const STORE_FILE_NAME: &str = "crossmatch_desi.hdf5";

const DEFAULT_RA_DATASET: &str = "desi/edr_sv3_ra";
const DEFAULT_DEC_DATASET: &str = "desi/edr_sv3_dec";

/// Handle to a match store root directory.
#[derive(Debug, Clone)]
pub struct MatchStore {
    root: PathBuf,
    ra_dataset: String,
    dec_dataset: String,
}

impl MatchStore {
    /// Open a store rooted at `root`. The root must already exist.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        if !root.is_dir() {
            return Err(StoreError::RootNotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            ra_dataset: DEFAULT_RA_DATASET.to_string(),
            dec_dataset: DEFAULT_DEC_DATASET.to_string(),
        })
    }

    /// Override the RA/Dec dataset paths inside each pixel file.
    pub fn with_datasets(mut self, ra: impl Into<String>, dec: impl Into<String>) -> Self {
        self.ra_dataset = ra.into();
        self.dec_dataset = dec.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the match file for a pixel, whether or not it exists.
    pub fn pixel_file(&self, pixel: u64) -> PathBuf {
        self.root.join(format!("healpix={pixel}")).join(STORE_FILE_NAME)
    }

    /// Pixels that have a match file under this root, ascending.
    pub fn list_pixels(&self) -> Result<Vec<u64>, StoreError> {
        let mut pixels = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(pixel) = name
                .to_str()
                .and_then(|n| n.strip_prefix("healpix="))
                .and_then(|n| n.parse::<u64>().ok())
            else {
                continue;
            };
            if entry.path().join(STORE_FILE_NAME).is_file() {
                pixels.push(pixel);
            }
        }
        pixels.sort_unstable();
        Ok(pixels)
    }

    /// Error unless a match file exists for `pixel`.
    pub fn require_pixel(&self, pixel: u64) -> Result<(), StoreError> {
        let path = self.pixel_file(pixel);
        if !path.is_file() {
            return Err(StoreError::PixelNotFound { pixel, path });
        }
        Ok(())
    }

    /// Read the stored coordinates for one pixel.
    pub fn read_coords(&self, pixel: u64) -> Result<SkyCoords, StoreError> {
        let path = self.pixel_file(pixel);
        if !path.is_file() {
            return Err(StoreError::PixelNotFound { pixel, path });
        }

        let file = hdf5::File::open(&path).map_err(|source| StoreError::Hdf5 {
            path: path.clone(),
            source,
        })?;

        let ra = read_f64_dataset(&file, &path, &self.ra_dataset)?;
        let dec = read_f64_dataset(&file, &path, &self.dec_dataset)?;

        let (ra_len, dec_len) = (ra.len(), dec.len());
        SkyCoords::new(ra, dec).map_err(|_| StoreError::LengthMismatch {
            path,
            ra_len,
            dec_len,
        })
    }

    /// Write (or overwrite) the coordinates for one pixel, creating the
    /// pixel directory as needed.
    pub fn write_coords(&self, pixel: u64, coords: &SkyCoords) -> Result<PathBuf, StoreError> {
        let path = self.pixel_file(pixel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = hdf5::File::create(&path).map_err(|source| StoreError::Hdf5 {
            path: path.clone(),
            source,
        })?;

        write_f64_dataset(&file, &path, &self.ra_dataset, coords.ra_deg())?;
        write_f64_dataset(&file, &path, &self.dec_dataset, coords.dec_deg())?;

        debug!(pixel, rows = coords.len(), path = %path.display(), "wrote match file");
        Ok(path)
    }
}

fn read_f64_dataset(
    file: &hdf5::File,
    path: &Path,
    dataset: &str,
) -> Result<Vec<f64>, StoreError> {
    let ds = file.dataset(dataset).map_err(|_| StoreError::MissingDataset {
        path: path.to_path_buf(),
        dataset: dataset.to_string(),
    })?;
    ds.read_raw::<f64>().map_err(|source| StoreError::Hdf5 {
        path: path.to_path_buf(),
        source,
    })
}

fn write_f64_dataset(
    file: &hdf5::File,
    path: &Path,
    dataset: &str,
    values: &[f64],
) -> Result<(), StoreError> {
    // Dataset paths like "desi/edr_sv3_ra" need their group created first.
    let (group, name) = match dataset.rsplit_once('/') {
        Some((group_path, name)) => {
            let group = file
                .create_group(group_path)
                .or_else(|_| file.group(group_path))
                .map_err(|source| StoreError::Hdf5 {
                    path: path.to_path_buf(),
                    source,
                })?;
            (Some(group), name)
        }
        None => (None, dataset),
    };

    let builder = match &group {
        Some(g) => g.new_dataset_builder(),
        None => file.new_dataset_builder(),
    };
    builder
        .with_data(values)
        .create(name)
        .map_err(|source| StoreError::Hdf5 {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
