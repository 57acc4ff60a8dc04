//! Coadd trim/extract integration tests over real FITS and HDF5 files.

use std::path::{Path, PathBuf};

use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;
use tempfile::TempDir;

use desipix_core::{
    extract_coadd, trim_coadd, trimmed_path, CoaddError, CoaddReader, ExtractOptions, SkyCoords,
    TrimOptions,
};

const ARCSEC: f64 = 1.0 / 3600.0;
const NWAVE: usize = 16;

/// Write a synthetic coadd: a FIBERMAP with the given positions and one `B`
/// band whose flux row `i` is filled with the value `i`.
fn write_coadd(path: &Path, coords: &[(f64, f64)]) {
    let n = coords.len();
    let mut fptr = FitsFile::create(path).open().unwrap();

    let columns = [
        ColumnDescription::new("TARGETID")
            .with_type(ColumnDataType::Long)
            .create()
            .unwrap(),
        ColumnDescription::new("TARGET_RA")
            .with_type(ColumnDataType::Double)
            .create()
            .unwrap(),
        ColumnDescription::new("TARGET_DEC")
            .with_type(ColumnDataType::Double)
            .create()
            .unwrap(),
    ];
    let hdu = fptr.create_table("FIBERMAP".to_string(), &columns).unwrap();

    let ids: Vec<i64> = (0..n as i64).map(|i| 39_000_000 + i).collect();
    let ra: Vec<f64> = coords.iter().map(|c| c.0).collect();
    let dec: Vec<f64> = coords.iter().map(|c| c.1).collect();
    hdu.write_col(&mut fptr, "TARGETID", &ids).unwrap();
    hdu.write_col(&mut fptr, "TARGET_RA", &ra).unwrap();
    hdu.write_col(&mut fptr, "TARGET_DEC", &dec).unwrap();

    let wave_desc = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[NWAVE],
    };
    let hdu = fptr.create_image("B_WAVELENGTH".to_string(), &wave_desc).unwrap();
    let wave: Vec<f32> = (0..NWAVE).map(|i| 3600.0 + i as f32).collect();
    hdu.write_image(&mut fptr, &wave).unwrap();

    let image_desc = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[n, NWAVE],
    };
    let hdu = fptr.create_image("B_FLUX".to_string(), &image_desc).unwrap();
    let flux: Vec<f32> = (0..n)
        .flat_map(|i| std::iter::repeat(i as f32).take(NWAVE))
        .collect();
    hdu.write_image(&mut fptr, &flux).unwrap();

    let hdu = fptr.create_image("B_IVAR".to_string(), &image_desc).unwrap();
    let ivar: Vec<f32> = vec![1.0; n * NWAVE];
    hdu.write_image(&mut fptr, &ivar).unwrap();
}

/// Ten coadd targets along a 2"-spaced Dec ladder.
fn target_ladder() -> Vec<(f64, f64)> {
    (0..10)
        .map(|i| (150.0, 2.0 + 2.0 * i as f64 * ARCSEC))
        .collect()
}

fn fixture_coadd(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("coadd-main-dark-26421.fits");
    write_coadd(&path, &target_ladder());
    path
}

#[test]
fn trim_keeps_only_matched_rows() {
    let dir = TempDir::new().unwrap();
    let coadd = fixture_coadd(&dir);

    // The catalog covers targets 0, 1 and 5 exactly.
    let targets = target_ladder();
    let catalog = SkyCoords::new(
        vec![targets[0].0, targets[1].0, targets[5].0],
        vec![targets[0].1, targets[1].1, targets[5].1],
    )
    .unwrap();

    let summary = trim_coadd(&coadd, &catalog, &TrimOptions::default()).unwrap();
    assert_eq!(summary.coadd_rows, 10);
    assert_eq!(summary.kept, 3);
    assert_eq!(summary.output, trimmed_path(&coadd));
    assert!(summary.output.exists());
    assert!(coadd.exists(), "original must survive without --delete-original");

    // The trimmed file carries the matched rows' spectra, in order.
    let mut reader = CoaddReader::open(&summary.output).unwrap();
    let fibermap = reader.fibermap().unwrap();
    assert_eq!(fibermap.len(), 3);
    assert_eq!(
        fibermap.targetid.as_ref().unwrap(),
        &[39_000_000, 39_000_001, 39_000_005]
    );

    let band = reader.band("B").unwrap().unwrap();
    assert_eq!(band.flux.nrows(), 3);
    assert_eq!(band.flux.ncols(), NWAVE);
    assert_eq!(band.flux[[2, 0]], 5.0);
    assert_eq!(band.wavelength.unwrap().len(), NWAVE);
    assert!(band.ivar.is_some());
    assert!(band.mask.is_none());
}

#[test]
fn report_radius_counts_looser_matches() {
    let dir = TempDir::new().unwrap();
    let coadd = fixture_coadd(&dir);

    // 1.5" off target 0: outside the 1" keep radius, inside 3".
    let catalog = SkyCoords::new(vec![150.0], vec![2.0 + 1.5 * ARCSEC]).unwrap();

    let summary = trim_coadd(&coadd, &catalog, &TrimOptions::default()).unwrap();
    assert_eq!(summary.kept, 0);
    assert!(summary.report_matches >= 1);
}

#[test]
fn trim_can_delete_the_original() {
    let dir = TempDir::new().unwrap();
    let coadd = fixture_coadd(&dir);
    let targets = target_ladder();
    let catalog = SkyCoords::new(vec![targets[0].0], vec![targets[0].1]).unwrap();

    let summary = trim_coadd(
        &coadd,
        &catalog,
        &TrimOptions {
            delete_original: true,
            ..TrimOptions::default()
        },
    )
    .unwrap();
    assert!(summary.deleted_original);
    assert!(!coadd.exists());
    assert!(summary.output.exists());
}

#[test]
fn trim_without_fibermap_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coadd-main-dark-1.fits");
    // A FITS file with only an image extension.
    let mut fptr = FitsFile::create(&path).open().unwrap();
    let desc = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[4],
    };
    let hdu = fptr.create_image("B_WAVELENGTH".to_string(), &desc).unwrap();
    hdu.write_image(&mut fptr, &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    drop(fptr);

    let catalog = SkyCoords::new(vec![150.0], vec![2.0]).unwrap();
    let err = trim_coadd(&path, &catalog, &TrimOptions::default()).unwrap_err();
    assert!(matches!(err, CoaddError::MissingHdu { .. }), "got {err}");
    assert!(path.exists(), "original must survive a failed trim");
}

#[test]
fn extract_writes_the_contracted_layout() {
    let dir = TempDir::new().unwrap();
    let coadd = fixture_coadd(&dir);
    let out = dir.path().join("coadd-main-dark-26421.hdf5");

    let summary = extract_coadd(&coadd, &out, &ExtractOptions::default()).unwrap();
    assert_eq!(summary.targets, 10);
    // R and Z are requested by default but absent; only B is written.
    assert_eq!(summary.bands, vec!["B"]);

    let file = hdf5::File::open(&out).unwrap();
    let ids: Vec<i64> = file.dataset("targetid").unwrap().read_raw().unwrap();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], 39_000_000);

    let ra: Vec<f64> = file.dataset("target_ra").unwrap().read_raw().unwrap();
    assert_eq!(ra.len(), 10);

    let flux = file.dataset("b/flux").unwrap();
    assert_eq!(flux.shape(), vec![10, NWAVE]);
    let wave: Vec<f32> = file.dataset("b/wavelength").unwrap().read_raw().unwrap();
    assert_eq!(wave.len(), NWAVE);
    assert!(file.dataset("b/mask").is_err(), "no mask in the fixture");
}

#[test]
fn extract_with_no_matching_bands_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let coadd = fixture_coadd(&dir);
    let out = dir.path().join("out.hdf5");

    let err = extract_coadd(
        &coadd,
        &out,
        &ExtractOptions {
            bands: vec!["R".to_string(), "Z".to_string()],
        },
    )
    .unwrap_err();
    assert!(matches!(err, CoaddError::NoBands { .. }), "got {err}");
}
