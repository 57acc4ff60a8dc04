//! Crossmatch counter integration tests.
//!
//! These build a real catalog CSV and real per-pixel HDF5 match files in a
//! temp directory, then verify:
//! - the documented end-to-end count (10 rows on one pixel, 7 stored within
//!   1 arcsec -> exactly 7 matches)
//! - aggregation consistency between pre-filtering and post-filtering
//! - hard errors for missing inputs and empty requested pixels

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use desipix_core::crossmatch::CountError;
use desipix_core::healpix::nested_center;
use desipix_core::{
    catalog_pixel, count_store_matches, Catalog, CatalogColumns, MatchStore, SkyCoords,
    StoreError, CATALOG_NSIDE,
};

const ARCSEC: f64 = 1.0 / 3600.0;

/// Ten catalog rows on coarse pixel 657, separated in Dec by 2" steps.
fn pixel_657_rows() -> Vec<(f64, f64)> {
    let (ra, dec) = nested_center(CATALOG_NSIDE, 657);
    (0..10)
        .map(|i| (ra, dec + 2.0 * i as f64 * ARCSEC))
        .collect()
}

fn write_catalog(path: &Path, rows: &[(f64, f64, u64)]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "RA_DESI,DEC_DESI,healpix").unwrap();
    for (ra, dec, pix) in rows {
        writeln!(file, "{ra},{dec},{pix}").unwrap();
    }
}

fn coords_of(rows: &[(f64, f64)]) -> SkyCoords {
    SkyCoords::new(
        rows.iter().map(|r| r.0).collect(),
        rows.iter().map(|r| r.1).collect(),
    )
    .unwrap()
}

struct Fixture {
    _dir: TempDir,
    catalog: Catalog,
    store_root: PathBuf,
}

/// Catalog with 10 rows on pixel 657 (7 of them stored) and 3 rows on a
/// second pixel (all stored).
fn build_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();

    let rows_657 = pixel_657_rows();
    for (ra, dec) in &rows_657 {
        assert_eq!(catalog_pixel(*ra, *dec), 657, "fixture row left pixel 657");
    }

    let (ra2, dec2) = nested_center(CATALOG_NSIDE, 1042);
    let rows_1042: Vec<(f64, f64)> = (0..3)
        .map(|i| (ra2, dec2 + 2.0 * i as f64 * ARCSEC))
        .collect();

    let catalog_path = dir.path().join("catalog.csv");
    let mut catalog_rows: Vec<(f64, f64, u64)> = rows_657
        .iter()
        .map(|&(ra, dec)| (ra, dec, 657))
        .collect();
    catalog_rows.extend(rows_1042.iter().map(|&(ra, dec)| (ra, dec, 1042)));
    write_catalog(&catalog_path, &catalog_rows);

    let store_root = dir.path().join("store");
    std::fs::create_dir(&store_root).unwrap();
    let store = MatchStore::open(&store_root).unwrap();
    // Pixel 657 holds exactly the first 7 of the 10 catalog coordinates.
    store.write_coords(657, &coords_of(&rows_657[..7])).unwrap();
    store.write_coords(1042, &coords_of(&rows_1042)).unwrap();

    let catalog = Catalog::load(&catalog_path, &CatalogColumns::default()).unwrap();
    Fixture {
        _dir: dir,
        catalog,
        store_root,
    }
}

#[test]
fn filtered_count_reports_exactly_the_stored_matches() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();

    let report = count_store_matches(&fixture.catalog, &store, Some(657), 1.0).unwrap();
    assert_eq!(report.per_pixel.len(), 1);
    assert_eq!(report.per_pixel[0].pixel, 657);
    assert_eq!(report.per_pixel[0].catalog_rows, 10);
    assert_eq!(report.per_pixel[0].store_rows, 7);
    assert_eq!(report.total_matches(), 7);
}

#[test]
fn prefilter_and_postfilter_agree() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();

    let full = count_store_matches(&fixture.catalog, &store, None, 1.0).unwrap();
    let filtered = count_store_matches(&fixture.catalog, &store, Some(657), 1.0).unwrap();

    let postfiltered: usize = full
        .per_pixel
        .iter()
        .filter(|p| p.pixel == 657)
        .map(|p| p.matches)
        .sum();
    assert_eq!(filtered.total_matches(), postfiltered);

    // The unfiltered total covers both pixels: 7 on 657, all 3 on 1042.
    assert_eq!(full.total_matches(), 10);
    assert_eq!(full.per_pixel.len(), 2);
}

#[test]
fn widening_the_radius_recovers_the_unstored_rows() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();

    // Rows 7..10 sit 2, 4 and 6 arcsec from the nearest stored coordinate.
    let report = count_store_matches(&fixture.catalog, &store, Some(657), 6.5).unwrap();
    assert_eq!(report.total_matches(), 10);
}

#[test]
fn requested_pixel_without_store_file_is_an_error() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();

    let err = count_store_matches(&fixture.catalog, &store, Some(9999), 1.0).unwrap_err();
    assert!(matches!(
        err,
        CountError::Store(StoreError::PixelNotFound { pixel: 9999, .. })
    ));
}

#[test]
fn requested_pixel_without_catalog_rows_is_an_error() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();
    // A store file exists for pixel 7 but no catalog rows map there.
    store
        .write_coords(7, &coords_of(&[(0.0, 45.0)]))
        .unwrap();

    let err = count_store_matches(&fixture.catalog, &store, Some(7), 1.0).unwrap_err();
    assert!(matches!(err, CountError::EmptyPixel { pixel: 7 }));
}

#[test]
fn unfiltered_scan_skips_pixels_without_catalog_rows() {
    let fixture = build_fixture();
    let store = MatchStore::open(&fixture.store_root).unwrap();
    store
        .write_coords(7, &coords_of(&[(0.0, 45.0)]))
        .unwrap();

    let report = count_store_matches(&fixture.catalog, &store, None, 1.0).unwrap();
    assert_eq!(report.total_matches(), 10);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, 7);
}

#[test]
fn missing_store_root_is_an_error() {
    assert!(matches!(
        MatchStore::open(Path::new("/nonexistent/store")),
        Err(StoreError::RootNotFound(_))
    ));
}
