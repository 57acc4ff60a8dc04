//! `count` and `count-local` subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use desipix_core::coadd::{count_local_matches, LocalCountOptions};
use desipix_core::{count_store_matches, Config, MatchStore};

use super::load_catalog;

#[derive(Args)]
pub struct CountArgs {
    /// Catalog CSV with RA/Dec and pixel-id columns.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Root directory containing healpix=*/crossmatch_desi.hdf5 files.
    #[arg(long)]
    pub hdf5_root: Option<PathBuf>,

    /// Maximum angular separation (arcsec) for a match.
    #[arg(long, default_value_t = 1.0)]
    pub max_arcsec: f64,

    /// Optional pixel id to limit the scan.
    #[arg(long)]
    pub healpix: Option<u64>,
}

pub fn run_count(args: CountArgs, config: &Config) -> Result<()> {
    let catalog = load_catalog(&args.csv, &None, &None, config)?;

    let root = args
        .hdf5_root
        .unwrap_or_else(|| config.store.root.clone());
    let mut store = MatchStore::open(&root)?;
    if let (Some(ra), Some(dec)) = (&config.store.ra_dataset, &config.store.dec_dataset) {
        store = store.with_datasets(ra.clone(), dec.clone());
    }

    let report = count_store_matches(&catalog, &store, args.healpix, args.max_arcsec)?;

    for pixel in &report.per_pixel {
        println!(
            "healpix={}: CSV rows={} | HDF rows={} | matches<= {}\" = {}",
            pixel.pixel, pixel.catalog_rows, pixel.store_rows, args.max_arcsec, pixel.matches
        );
    }
    for (pixel, reason) in &report.skipped {
        println!("healpix={pixel}: skipped ({reason})");
    }
    println!(
        "TOTAL: CSV rows={} | HDF rows={} | matches<= {}\" = {}",
        report.total_catalog_rows(),
        report.total_store_rows(),
        args.max_arcsec,
        report.total_matches()
    );
    Ok(())
}

#[derive(Args)]
pub struct CountLocalArgs {
    /// Catalog CSV with RA/Dec columns.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Directories to search for coadd-*.fits files.
    #[arg(long, required = true, num_args = 1..)]
    pub roots: Vec<PathBuf>,

    /// Maximum separation in arcsec for a match.
    #[arg(long, default_value_t = 1.0)]
    pub max_arcsec: f64,

    /// Limit the number of coadd files processed (for quick tests).
    #[arg(long)]
    pub limit_files: Option<usize>,

    /// Limit the number of catalog rows (for quick tests).
    #[arg(long)]
    pub csv_limit: Option<usize>,
}

pub fn run_count_local(args: CountLocalArgs, config: &Config) -> Result<()> {
    let mut catalog = load_catalog(&args.csv, &None, &None, config)?;
    if let Some(limit) = args.csv_limit {
        catalog.truncate(limit);
    }
    let coords = catalog.coords();

    println!("CSV rows: {}", coords.len());

    let report = count_local_matches(
        &coords,
        &args.roots,
        &LocalCountOptions {
            max_arcsec: args.max_arcsec,
            limit_files: args.limit_files,
        },
    )
    .context("local coadd scan failed")?;

    println!("Coadd files found: {}", report.files.len());
    for file in &report.files {
        println!(
            "{}: targets={} csv_matches<= {}\" = {}",
            file.path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.path.display().to_string()),
            file.targets,
            args.max_arcsec,
            file.catalog_matches
        );
    }
    println!(
        "TOTAL unique CSV matches<= {}\": {}",
        args.max_arcsec, report.unique_catalog_matches
    );
    Ok(())
}
