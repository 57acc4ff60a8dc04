//! Trim a coadd to the rows matched by the catalog.

use std::path::{Path, PathBuf};

use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;
use ndarray::{Array2, Axis};
use tracing::info;

use super::reader::CoaddReader;
use super::types::{BandData, CoaddError, FiberMap, DEFAULT_BANDS};
use crate::crossmatch::{match_indices, SkyCoords};
use crate::metrics;

/// Options for trimming.
#[derive(Debug, Clone)]
pub struct TrimOptions {
    /// Match radius used for keeping rows.
    pub max_arcsec: f64,
    /// Looser radius counted for reporting only.
    pub report_arcsec: f64,
    /// Output path; defaults to `<coadd>.trimmed.fits`.
    pub out: Option<PathBuf>,
    /// Delete the raw coadd after a verified trim.
    pub delete_original: bool,
    /// Bands carried into the trimmed file.
    pub bands: Vec<String>,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            max_arcsec: 1.0,
            report_arcsec: 3.0,
            out: None,
            delete_original: false,
            bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Result of one trim.
#[derive(Debug, Clone)]
pub struct TrimSummary {
    /// Rows in the raw coadd.
    pub coadd_rows: usize,
    /// Rows kept within the match radius.
    pub kept: usize,
    /// Rows within the looser report radius.
    pub report_matches: usize,
    pub output: PathBuf,
    pub deleted_original: bool,
}

/// Default trimmed-output path for a coadd file.
pub fn trimmed_path(coadd: &Path) -> PathBuf {
    let name = coadd
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.strip_suffix(".fits").unwrap_or(&name);
    coadd.with_file_name(format!("{stem}.trimmed.fits"))
}

/// Keep only the coadd rows whose position matches a catalog coordinate
/// within `max_arcsec`, writing a trimmed FITS with the filtered FIBERMAP
/// and band arrays.
///
/// After writing, the trimmed FIBERMAP row count is verified against the
/// kept-index count; a mismatch is an error and the original is never
/// deleted on any failure.
pub fn trim_coadd(
    coadd_path: &Path,
    catalog_coords: &SkyCoords,
    options: &TrimOptions,
) -> Result<TrimSummary, CoaddError> {
    let out_path = options
        .out
        .clone()
        .unwrap_or_else(|| trimmed_path(coadd_path));

    let mut reader = CoaddReader::open(coadd_path)?;
    let fibermap = reader.fibermap()?;

    let keep = match_indices(&fibermap.coords, catalog_coords, options.max_arcsec);
    let report_matches =
        match_indices(&fibermap.coords, catalog_coords, options.report_arcsec).len();

    let bands = reader.bands(&options.bands)?;
    drop(reader);

    write_trimmed(&out_path, &fibermap, &keep, &bands)?;
    verify_trimmed(&out_path, keep.len())?;

    metrics::COADDS_TRIMMED.inc();
    metrics::TRIM_ROWS_KEPT.inc_by(keep.len() as u64);

    let mut deleted_original = false;
    if options.delete_original {
        std::fs::remove_file(coadd_path)?;
        deleted_original = true;
        info!(path = %coadd_path.display(), "deleted original coadd");
    }

    info!(
        coadd = %coadd_path.display(),
        output = %out_path.display(),
        coadd_rows = fibermap.len(),
        kept = keep.len(),
        max_arcsec = options.max_arcsec,
        report_matches,
        report_arcsec = options.report_arcsec,
        "trimmed coadd"
    );

    Ok(TrimSummary {
        coadd_rows: fibermap.len(),
        kept: keep.len(),
        report_matches,
        output: out_path,
        deleted_original,
    })
}

fn write_trimmed(
    out_path: &Path,
    fibermap: &FiberMap,
    keep: &[usize],
    bands: &[(String, BandData)],
) -> Result<(), CoaddError> {
    let fits_err = |source: fitsio::errors::Error| CoaddError::Fits {
        path: out_path.to_path_buf(),
        source,
    };

    let mut out = FitsFile::create(out_path)
        .overwrite()
        .open()
        .map_err(fits_err)?;

    // FIBERMAP with the kept rows only.
    let mut columns = Vec::new();
    if fibermap.targetid.is_some() {
        columns.push(
            ColumnDescription::new("TARGETID")
                .with_type(ColumnDataType::Long)
                .create()
                .map_err(fits_err)?,
        );
    }
    columns.push(
        ColumnDescription::new("TARGET_RA")
            .with_type(ColumnDataType::Double)
            .create()
            .map_err(fits_err)?,
    );
    columns.push(
        ColumnDescription::new("TARGET_DEC")
            .with_type(ColumnDataType::Double)
            .create()
            .map_err(fits_err)?,
    );

    let hdu = out
        .create_table("FIBERMAP".to_string(), &columns)
        .map_err(fits_err)?;

    if let Some(ids) = &fibermap.targetid {
        let kept_ids: Vec<i64> = keep.iter().map(|&i| ids[i]).collect();
        hdu.write_col(&mut out, "TARGETID", &kept_ids)
            .map_err(fits_err)?;
    }
    let kept_coords = fibermap.coords.select(keep);
    hdu.write_col(&mut out, "TARGET_RA", kept_coords.ra_deg())
        .map_err(fits_err)?;
    hdu.write_col(&mut out, "TARGET_DEC", kept_coords.dec_deg())
        .map_err(fits_err)?;

    for (band, data) in bands {
        if let Some(wavelength) = &data.wavelength {
            write_image_1d(&mut out, out_path, &format!("{band}_WAVELENGTH"), wavelength)?;
        }
        write_image_2d(
            &mut out,
            out_path,
            &format!("{band}_FLUX"),
            &select_rows(&data.flux, keep),
        )?;
        if let Some(ivar) = &data.ivar {
            write_image_2d(
                &mut out,
                out_path,
                &format!("{band}_IVAR"),
                &select_rows(ivar, keep),
            )?;
        }
        if let Some(mask) = &data.mask {
            write_mask_2d(
                &mut out,
                out_path,
                &format!("{band}_MASK"),
                &select_rows(mask, keep),
            )?;
        }
    }

    Ok(())
}

fn select_rows<T: Clone>(array: &Array2<T>, keep: &[usize]) -> Array2<T> {
    array.select(Axis(0), keep)
}

fn write_image_1d(
    out: &mut FitsFile,
    out_path: &Path,
    name: &str,
    data: &[f32],
) -> Result<(), CoaddError> {
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[data.len()],
    };
    let hdu = out
        .create_image(name.to_string(), &description)
        .map_err(|source| CoaddError::Fits {
            path: out_path.to_path_buf(),
            source,
        })?;
    hdu.write_image(out, data).map_err(|source| CoaddError::Fits {
        path: out_path.to_path_buf(),
        source,
    })
}

fn write_image_2d(
    out: &mut FitsFile,
    out_path: &Path,
    name: &str,
    data: &Array2<f32>,
) -> Result<(), CoaddError> {
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[data.nrows(), data.ncols()],
    };
    let hdu = out
        .create_image(name.to_string(), &description)
        .map_err(|source| CoaddError::Fits {
            path: out_path.to_path_buf(),
            source,
        })?;
    let flat: Vec<f32> = data.iter().copied().collect();
    hdu.write_image(out, &flat).map_err(|source| CoaddError::Fits {
        path: out_path.to_path_buf(),
        source,
    })
}

fn write_mask_2d(
    out: &mut FitsFile,
    out_path: &Path,
    name: &str,
    data: &Array2<i32>,
) -> Result<(), CoaddError> {
    let description = ImageDescription {
        data_type: ImageType::Long,
        dimensions: &[data.nrows(), data.ncols()],
    };
    let hdu = out
        .create_image(name.to_string(), &description)
        .map_err(|source| CoaddError::Fits {
            path: out_path.to_path_buf(),
            source,
        })?;
    let flat: Vec<i32> = data.iter().copied().collect();
    hdu.write_image(out, &flat).map_err(|source| CoaddError::Fits {
        path: out_path.to_path_buf(),
        source,
    })
}

/// Re-open the trimmed file and check the FIBERMAP row count.
fn verify_trimmed(out_path: &Path, expected: usize) -> Result<(), CoaddError> {
    let mut reader = CoaddReader::open(out_path)?;
    let actual = reader.fibermap()?.len();
    if actual != expected {
        return Err(CoaddError::RowCountMismatch {
            path: out_path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_path_replaces_suffix() {
        assert_eq!(
            trimmed_path(Path::new("/data/coadd-main-dark-7.fits")),
            Path::new("/data/coadd-main-dark-7.trimmed.fits")
        );
    }

    #[test]
    fn select_rows_filters_leading_axis() {
        let array = Array2::from_shape_vec((3, 2), vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let selected = select_rows(&array, &[0, 2]);
        assert_eq!(selected.nrows(), 2);
        assert_eq!(selected[[1, 0]], 5.0);
    }
}
