//! Reading coadd FITS files.

use std::path::{Path, PathBuf};

use fitsio::hdu::HduInfo;
use fitsio::FitsFile;
use ndarray::Array2;
use tracing::warn;

use super::types::{sorted_coadd_files, BandData, CoaddError, FiberMap};
use crate::crossmatch::SkyCoords;

/// Open-file reader over a coadd's FIBERMAP and band HDUs.
pub struct CoaddReader {
    fptr: FitsFile,
    path: PathBuf,
}

impl std::fmt::Debug for CoaddReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoaddReader")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CoaddReader {
    pub fn open(path: &Path) -> Result<Self, CoaddError> {
        if !path.is_file() {
            return Err(CoaddError::NotFound(path.to_path_buf()));
        }
        let fptr = FitsFile::open(path).map_err(|source| CoaddError::Fits {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            fptr,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the identifier/coordinate table.
    ///
    /// Coordinates come from `TARGET_RA`/`TARGET_DEC`, falling back to
    /// `RA`/`DEC`; a FIBERMAP with neither pair is an error, never an empty
    /// result.
    pub fn fibermap(&mut self) -> Result<FiberMap, CoaddError> {
        let hdu = self
            .fptr
            .hdu("FIBERMAP")
            .map_err(|_| CoaddError::MissingHdu {
                path: self.path.clone(),
                hdu: "FIBERMAP".to_string(),
            })?;

        let targetid: Option<Vec<i64>> = hdu.read_col(&mut self.fptr, "TARGETID").ok();

        let ra: Vec<f64> = match hdu.read_col(&mut self.fptr, "TARGET_RA") {
            Ok(ra) => ra,
            Err(_) => hdu
                .read_col(&mut self.fptr, "RA")
                .map_err(|_| CoaddError::FiberMap {
                    path: self.path.clone(),
                    detail: "has no TARGET_RA/TARGET_DEC or RA/DEC columns".to_string(),
                })?,
        };
        let dec: Vec<f64> = hdu
            .read_col(&mut self.fptr, "TARGET_DEC")
            .or_else(|_| hdu.read_col(&mut self.fptr, "DEC"))
            .map_err(|_| CoaddError::FiberMap {
                path: self.path.clone(),
                detail: "has no TARGET_RA/TARGET_DEC or RA/DEC columns".to_string(),
            })?;

        let coords = SkyCoords::new(ra, dec).map_err(|e| CoaddError::FiberMap {
            path: self.path.clone(),
            detail: e.to_string(),
        })?;

        if let Some(ids) = &targetid {
            if ids.len() != coords.len() {
                return Err(CoaddError::FiberMap {
                    path: self.path.clone(),
                    detail: format!(
                        "TARGETID has {} rows but coordinates have {}",
                        ids.len(),
                        coords.len()
                    ),
                });
            }
        }

        Ok(FiberMap { targetid, coords })
    }

    /// Read one band's arrays, or `None` when the band's flux HDU is absent.
    pub fn band(&mut self, band: &str) -> Result<Option<BandData>, CoaddError> {
        let flux = match self.read_image_2d(&format!("{band}_FLUX"))? {
            Some(flux) => flux,
            None => return Ok(None),
        };

        let wavelength = match self.read_image_1d(&format!("{band}_WAVELENGTH"))? {
            Some(wave) => Some(wave),
            None => self.read_image_1d(&format!("{band}_WAVE"))?,
        };

        let ivar = self.read_image_2d(&format!("{band}_IVAR"))?;
        let mask = self.read_mask_2d(&format!("{band}_MASK"))?;

        Ok(Some(BandData {
            wavelength,
            flux,
            ivar,
            mask,
        }))
    }

    /// Read the requested bands, warning on absent ones. Zero readable
    /// bands is an error rather than an empty output.
    pub fn bands(&mut self, requested: &[String]) -> Result<Vec<(String, BandData)>, CoaddError> {
        let mut found = Vec::new();
        for band in requested {
            match self.band(band)? {
                Some(data) => found.push((band.clone(), data)),
                None => {
                    warn!(band = %band, path = %self.path.display(), "band not found in coadd")
                }
            }
        }
        if found.is_empty() {
            return Err(CoaddError::NoBands {
                path: self.path.clone(),
                bands: requested.to_vec(),
            });
        }
        Ok(found)
    }

    fn image_shape(&mut self, name: &str) -> Result<Option<Vec<usize>>, CoaddError> {
        let Ok(hdu) = self.fptr.hdu(name) else {
            return Ok(None);
        };
        match &hdu.info {
            HduInfo::ImageInfo { shape, .. } => Ok(Some(shape.clone())),
            _ => Err(CoaddError::BadShape {
                path: self.path.clone(),
                hdu: name.to_string(),
                detail: "not an image extension".to_string(),
            }),
        }
    }

    fn read_image_1d(&mut self, name: &str) -> Result<Option<Vec<f32>>, CoaddError> {
        let Some(shape) = self.image_shape(name)? else {
            return Ok(None);
        };
        if shape.len() != 1 {
            return Err(CoaddError::BadShape {
                path: self.path.clone(),
                hdu: name.to_string(),
                detail: format!("expected 1 axis, found {}", shape.len()),
            });
        }
        let hdu = self.fptr.hdu(name).map_err(|source| CoaddError::Fits {
            path: self.path.clone(),
            source,
        })?;
        let data: Vec<f32> = hdu
            .read_image(&mut self.fptr)
            .map_err(|source| CoaddError::Fits {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(data))
    }

    fn read_image_2d(&mut self, name: &str) -> Result<Option<Array2<f32>>, CoaddError> {
        let Some(shape) = self.image_shape(name)? else {
            return Ok(None);
        };
        let hdu = self.fptr.hdu(name).map_err(|source| CoaddError::Fits {
            path: self.path.clone(),
            source,
        })?;
        let data: Vec<f32> = hdu
            .read_image(&mut self.fptr)
            .map_err(|source| CoaddError::Fits {
                path: self.path.clone(),
                source,
            })?;
        self.reshape_2d(name, shape, data)
            .map(Some)
    }

    fn read_mask_2d(&mut self, name: &str) -> Result<Option<Array2<i32>>, CoaddError> {
        let Some(shape) = self.image_shape(name)? else {
            return Ok(None);
        };
        let hdu = self.fptr.hdu(name).map_err(|source| CoaddError::Fits {
            path: self.path.clone(),
            source,
        })?;
        let data: Vec<i32> = hdu
            .read_image(&mut self.fptr)
            .map_err(|source| CoaddError::Fits {
                path: self.path.clone(),
                source,
            })?;
        self.reshape_2d(name, shape, data)
            .map(Some)
    }

    fn reshape_2d<T>(
        &self,
        name: &str,
        shape: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Array2<T>, CoaddError> {
        if shape.len() != 2 {
            return Err(CoaddError::BadShape {
                path: self.path.clone(),
                hdu: name.to_string(),
                detail: format!("expected 2 axes, found {}", shape.len()),
            });
        }
        // FITS shape is slowest-axis first: (targets, wavelengths).
        Array2::from_shape_vec((shape[0], shape[1]), data).map_err(|e| CoaddError::BadShape {
            path: self.path.clone(),
            hdu: name.to_string(),
            detail: e.to_string(),
        })
    }
}

/// Arriving coadd files under a root, sorted by name. Already-trimmed
/// outputs are excluded.
pub fn list_coadd_files(root: &Path) -> Result<Vec<PathBuf>, CoaddError> {
    if !root.is_dir() {
        return Err(CoaddError::NotFound(root.to_path_buf()));
    }
    Ok(sorted_coadd_files(root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_found() {
        let err = CoaddReader::open(Path::new("/nonexistent/coadd-a-b-1.fits")).unwrap_err();
        assert!(matches!(err, CoaddError::NotFound(_)));
    }

    #[test]
    fn listing_skips_trimmed_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in [
            "coadd-main-dark-2.fits",
            "coadd-main-dark-1.fits",
            "coadd-main-dark-1.trimmed.fits",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = list_coadd_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["coadd-main-dark-1.fits", "coadd-main-dark-2.fits"]);
    }

    #[test]
    fn listing_missing_root_fails() {
        assert!(matches!(
            list_coadd_files(Path::new("/nonexistent/dir")),
            Err(CoaddError::NotFound(_))
        ));
    }
}
