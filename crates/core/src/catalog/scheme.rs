//! Pixelisation scheme checks: verify the catalog's pixel column against the
//! pinned convention, or deduce which convention produced it.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use super::reader::Catalog;
use super::types::CatalogError;
use crate::healpix::{coadd_pixel, guess_nside_from_max, pixel_group, Ordering, PixelScheme};

/// Documented consistency of the source catalog under the pinned scheme.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.999;

/// Summary of a catalog's pixel-id column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub min: i64,
    pub max: i64,
    pub unique: usize,
    pub nside_guess: u32,
}

/// Match rate of one candidate scheme against the stored column.
#[derive(Debug, Clone)]
pub struct CandidateRate {
    pub scheme: PixelScheme,
    pub match_rate: f64,
}

/// Full scheme-deduction report.
#[derive(Debug, Clone)]
pub struct SchemeReport {
    pub summary: ColumnSummary,
    pub candidates: Vec<CandidateRate>,
    pub best: CandidateRate,
}

/// Fraction of rows whose stored pixel id equals recomputation under
/// `scheme`. Errors if the rate falls below `threshold` — a low rate means
/// the column was produced under a different resolution or ordering, which
/// silently breaks every per-pixel lookup downstream.
pub fn verify_scheme(
    catalog: &Catalog,
    scheme: PixelScheme,
    threshold: f64,
) -> Result<f64, CatalogError> {
    let rate = match_rate(catalog, scheme)?;
    if rate < threshold {
        return Err(CatalogError::SchemeMismatch {
            scheme,
            match_rate: rate,
            threshold,
        });
    }
    Ok(rate)
}

/// Recompute pixel ids under candidate (NSIDE, ordering) pairs and report
/// how well each reproduces the stored column.
pub fn deduce_scheme(catalog: &Catalog) -> Result<SchemeReport, CatalogError> {
    let stored = catalog.healpix()?;
    if stored.is_empty() {
        return Err(CatalogError::InvalidValue {
            path: catalog.path().to_path_buf(),
            row: 0,
            column: "healpix".to_string(),
            value: "<empty column>".to_string(),
        });
    }

    let min = *stored.iter().min().unwrap_or(&0);
    let max = *stored.iter().max().unwrap_or(&0);
    let unique = stored.iter().collect::<BTreeSet<_>>().len();
    let nside_guess = guess_nside_from_max(max.max(0) as u64);

    let summary = ColumnSummary {
        min,
        max,
        unique,
        nside_guess,
    };

    let mut nsides = BTreeSet::from([8u32, 16, 32, 64, 128]);
    nsides.insert(nside_guess);
    if nside_guess > 1 {
        nsides.insert(nside_guess / 2);
    }
    nsides.insert(nside_guess * 2);

    let mut candidates = Vec::new();
    for nside in nsides {
        for ordering in [Ordering::Nested, Ordering::Ring] {
            let scheme = PixelScheme { nside, ordering };
            let rate = match_rate(catalog, scheme)?;
            info!(scheme = %scheme, match_rate = rate, "candidate scheme");
            candidates.push(CandidateRate {
                scheme,
                match_rate: rate,
            });
        }
    }

    let best = candidates
        .iter()
        .max_by(|a, b| a.match_rate.total_cmp(&b.match_rate))
        .cloned()
        .unwrap_or_else(|| unreachable!("candidate list is never empty"));

    if best.match_rate < DEFAULT_CONSISTENCY_THRESHOLD {
        warn!(
            best = %best.scheme,
            match_rate = best.match_rate,
            "no candidate scheme reproduces the pixel column; it may be a \
             shard id or computed from different coordinates"
        );
    }

    Ok(SchemeReport {
        summary,
        candidates,
        best,
    })
}

/// Sorted unique fine pixel ids (NSIDE=64, NESTED) covering the catalog.
pub fn unique_coadd_pixels(catalog: &Catalog) -> Vec<u64> {
    let mut pixels: BTreeSet<u64> = BTreeSet::new();
    for row in 0..catalog.len() {
        pixels.insert(coadd_pixel(catalog.ra_deg()[row], catalog.dec_deg()[row]));
    }
    pixels.into_iter().collect()
}

/// Write the unique pixel list as a plain-text id-per-line file and as a CSV
/// with the derived group column, for feeding the transfer requester.
pub fn write_pixel_lists(
    pixels: &[u64],
    txt_path: &Path,
    csv_path: &Path,
) -> Result<(), CatalogError> {
    let mut txt = std::fs::File::create(txt_path)?;
    for pix in pixels {
        writeln!(txt, "{pix}")?;
    }

    let mut writer = csv::Writer::from_path(csv_path).map_err(|source| CatalogError::Csv {
        path: csv_path.to_path_buf(),
        source,
    })?;
    writer
        .write_record(["pix64", "group"])
        .map_err(|source| CatalogError::Csv {
            path: csv_path.to_path_buf(),
            source,
        })?;
    for pix in pixels {
        writer
            .write_record([pix.to_string(), pixel_group(*pix).to_string()])
            .map_err(|source| CatalogError::Csv {
                path: csv_path.to_path_buf(),
                source,
            })?;
    }
    writer.flush()?;
    Ok(())
}

fn match_rate(catalog: &Catalog, scheme: PixelScheme) -> Result<f64, CatalogError> {
    let stored = catalog.healpix()?;
    if stored.is_empty() {
        return Ok(0.0);
    }
    let matching = stored
        .iter()
        .enumerate()
        .filter(|(row, &pix)| {
            pix >= 0 && scheme.ang2pix(catalog.ra_deg()[*row], catalog.dec_deg()[*row]) == pix as u64
        })
        .count();
    Ok(matching as f64 / stored.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogColumns;
    use crate::healpix::nested_center;
    use std::io::Write as _;
    use tempfile::TempDir;

    /// Catalog whose pixel column was genuinely computed at NSIDE=16 NESTED.
    fn consistent_catalog(dir: &TempDir) -> Catalog {
        let path = dir.path().join("cat.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "RA_DESI,DEC_DESI,healpix").unwrap();
        for pix in (0..3072u64).step_by(37) {
            let (ra, dec) = nested_center(16, pix);
            writeln!(file, "{ra},{dec},{pix}").unwrap();
        }
        drop(file);
        Catalog::load(&path, &CatalogColumns::default()).unwrap()
    }

    #[test]
    fn verify_passes_on_consistent_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = consistent_catalog(&dir);
        let rate = verify_scheme(
            &catalog,
            PixelScheme::nested(16),
            DEFAULT_CONSISTENCY_THRESHOLD,
        )
        .unwrap();
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn verify_flags_wrong_ordering() {
        let dir = TempDir::new().unwrap();
        let catalog = consistent_catalog(&dir);
        let err = verify_scheme(
            &catalog,
            PixelScheme::ring(16),
            DEFAULT_CONSISTENCY_THRESHOLD,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::SchemeMismatch { .. }));
    }

    #[test]
    fn deduce_finds_the_generating_scheme() {
        let dir = TempDir::new().unwrap();
        let catalog = consistent_catalog(&dir);
        let report = deduce_scheme(&catalog).unwrap();
        assert_eq!(report.summary.nside_guess, 16);
        assert_eq!(report.best.scheme, PixelScheme::nested(16));
        assert_eq!(report.best.match_rate, 1.0);
    }

    #[test]
    fn pixel_lists_roundtrip() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("pix64.txt");
        let csv_path = dir.path().join("pix64.csv");
        write_pixel_lists(&[12, 3400, 26421], &txt, &csv_path).unwrap();

        let content = std::fs::read_to_string(&txt).unwrap();
        assert_eq!(content, "12\n3400\n26421\n");

        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv_content.starts_with("pix64,group\n"));
        assert!(csv_content.contains("26421,264"));
    }

    #[test]
    fn unique_pixels_are_sorted_and_deduped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.csv");
        let (ra1, dec1) = nested_center(64, 100);
        let (ra2, dec2) = nested_center(64, 7);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "RA_DESI,DEC_DESI").unwrap();
        writeln!(file, "{ra1},{dec1}").unwrap();
        writeln!(file, "{ra2},{dec2}").unwrap();
        writeln!(file, "{ra1},{dec1}").unwrap();
        drop(file);

        let catalog = Catalog::load(&path, &CatalogColumns::default()).unwrap();
        assert_eq!(unique_coadd_pixels(&catalog), vec![7, 100]);
    }
}
