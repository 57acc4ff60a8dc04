//! Count catalog rows matched by the per-pixel store.

use thiserror::Error;
use tracing::{info, warn};

use super::separation::count_within;
use crate::catalog::{Catalog, CatalogError};
use crate::store::{MatchStore, StoreError};

/// Errors from the crossmatch counter.
#[derive(Debug, Error)]
pub enum CountError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A pixel filter was requested but the catalog has no rows there.
    #[error("catalog has no rows for requested pixel {pixel}")]
    EmptyPixel { pixel: u64 },
}

/// Counts for a single pixel.
#[derive(Debug, Clone)]
pub struct PixelCount {
    pub pixel: u64,
    pub catalog_rows: usize,
    pub store_rows: usize,
    pub matches: usize,
}

/// Aggregated count report.
#[derive(Debug, Clone, Default)]
pub struct CountReport {
    pub per_pixel: Vec<PixelCount>,
    /// Pixels skipped in an unfiltered scan, with the reason.
    pub skipped: Vec<(u64, String)>,
}

impl CountReport {
    pub fn total_catalog_rows(&self) -> usize {
        self.per_pixel.iter().map(|p| p.catalog_rows).sum()
    }

    pub fn total_store_rows(&self) -> usize {
        self.per_pixel.iter().map(|p| p.store_rows).sum()
    }

    pub fn total_matches(&self) -> usize {
        self.per_pixel.iter().map(|p| p.matches).sum()
    }
}

/// For each per-pixel match file, count the catalog rows of that pixel
/// whose nearest stored coordinate lies within `max_arcsec`.
///
/// With `pixel_filter` set, a missing match file or an empty catalog slice
/// is a hard error; in an unfiltered scan such pixels are logged and
/// recorded in [`CountReport::skipped`]. Either way nothing is silently
/// dropped, and filtering up front yields the same counts as filtering a
/// full report afterwards.
pub fn count_store_matches(
    catalog: &Catalog,
    store: &MatchStore,
    pixel_filter: Option<u64>,
    max_arcsec: f64,
) -> Result<CountReport, CountError> {
    let grouped = catalog.rows_by_pixel()?;
    let coords = catalog.coords();

    let pixels: Vec<u64> = match pixel_filter {
        Some(pixel) => {
            store.require_pixel(pixel)?;
            if !grouped.contains_key(&(pixel as i64)) {
                return Err(CountError::EmptyPixel { pixel });
            }
            vec![pixel]
        }
        None => store.list_pixels()?,
    };

    let mut report = CountReport::default();

    for pixel in pixels {
        let Some(rows) = grouped.get(&(pixel as i64)) else {
            info!(pixel, "no catalog rows; skipping");
            report.skipped.push((pixel, "no catalog rows".to_string()));
            continue;
        };

        let store_coords = match store.read_coords(pixel) {
            Ok(coords) => coords,
            Err(err) if pixel_filter.is_none() => {
                warn!(pixel, error = %err, "failed to read match file; skipping");
                report.skipped.push((pixel, err.to_string()));
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let pixel_coords = coords.select(rows);
        let matches = count_within(&pixel_coords, &store_coords, max_arcsec);

        info!(
            pixel,
            catalog_rows = rows.len(),
            store_rows = store_coords.len(),
            matches,
            max_arcsec,
            "counted pixel"
        );

        report.per_pixel.push(PixelCount {
            pixel,
            catalog_rows: rows.len(),
            store_rows: store_coords.len(),
            matches,
        });
    }

    Ok(report)
}
