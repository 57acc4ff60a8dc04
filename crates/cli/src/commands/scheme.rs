//! `deduce-scheme` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use desipix_core::{
    deduce_scheme, unique_coadd_pixels, verify_scheme, write_pixel_lists, Catalog, Config,
    PixelScheme, CATALOG_NSIDE, DEFAULT_CONSISTENCY_THRESHOLD,
};

use super::{catalog_columns, catalog_path};

#[derive(Args)]
pub struct DeduceArgs {
    /// Catalog CSV to inspect.
    pub csv: Option<PathBuf>,

    /// RA column name.
    #[arg(long)]
    pub ra_col: Option<String>,

    /// Dec column name.
    #[arg(long)]
    pub dec_col: Option<String>,

    /// Limit on catalog rows sampled.
    #[arg(long, default_value_t = 200_000)]
    pub max_rows: usize,

    /// Output path for the unique pix64 list.
    #[arg(long, default_value = "desi_dr1_pix64_unique.txt")]
    pub out_pix64: PathBuf,

    /// Output path for the unique pix64 CSV (with group column).
    #[arg(long, default_value = "desi_dr1_pix64_unique.csv")]
    pub out_pix64_csv: PathBuf,

    /// Also verify the column against the pinned catalog scheme (NSIDE=16
    /// NESTED) and fail when the match rate falls below the threshold.
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: DeduceArgs, config: &Config) -> Result<()> {
    let path = catalog_path(&args.csv, config);
    let columns = catalog_columns(&args.ra_col, &args.dec_col, config);
    let mut catalog = Catalog::load(&path, &columns)?;
    catalog.truncate(args.max_rows);

    let report = deduce_scheme(&catalog)?;

    println!("=== Input healpix column summary ===");
    println!(
        "min={} max={} nunique={}",
        report.summary.min, report.summary.max, report.summary.unique
    );
    println!(
        "nside_guess_from_maxpix={} (expected max ~ {})",
        report.summary.nside_guess,
        12 * report.summary.nside_guess as u64 * report.summary.nside_guess as u64 - 1
    );

    println!("\n=== Matching (recompute pix from RA/Dec and compare) ===");
    for candidate in &report.candidates {
        println!(
            "nside={:>4} ordering={:>6}  match_rate={:.6}",
            candidate.scheme.nside,
            candidate.scheme.ordering.to_string(),
            candidate.match_rate
        );
    }

    println!("\n=== Best inferred scheme for healpix column ===");
    println!(
        "best_match_rate={:.6}  {}",
        report.best.match_rate, report.best.scheme
    );
    if report.best.match_rate < DEFAULT_CONSISTENCY_THRESHOLD {
        println!("\nWARNING: match_rate < {DEFAULT_CONSISTENCY_THRESHOLD}.");
        println!("The healpix column may be a shard/bucket id or computed differently.");
    }

    if args.check {
        let rate = verify_scheme(
            &catalog,
            PixelScheme::nested(CATALOG_NSIDE),
            DEFAULT_CONSISTENCY_THRESHOLD,
        )?;
        println!("\nPinned scheme check passed (match rate {rate:.6})");
    }

    let pixels = unique_coadd_pixels(&catalog);
    write_pixel_lists(&pixels, &args.out_pix64, &args.out_pix64_csv)?;

    println!("\n=== Output ===");
    println!("Wrote {} unique DESI DR1 pixels (NSIDE=64 NESTED)", pixels.len());
    println!("- {}  (pix64 + group)", args.out_pix64_csv.display());
    println!("- {}  (pix64 list)", args.out_pix64.display());
    Ok(())
}
