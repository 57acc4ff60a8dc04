//! `trim` and `batch` subcommands.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use desipix_core::{process_batch, trim_coadd, Config, TrimOptions};

use super::load_catalog;

#[derive(Args)]
pub struct TrimArgs {
    /// Path to the coadd FITS file.
    pub coadd: PathBuf,

    /// Catalog CSV with RA/Dec columns.
    pub csv: Option<PathBuf>,

    /// RA column name.
    #[arg(long)]
    pub ra_col: Option<String>,

    /// Dec column name.
    #[arg(long)]
    pub dec_col: Option<String>,

    /// Match radius (arcsec) for kept rows.
    #[arg(long, default_value_t = 1.0)]
    pub max_arcsec: f64,

    /// Looser radius (arcsec) counted for reporting only.
    #[arg(long, default_value_t = 3.0)]
    pub report_arcsec: f64,

    /// Output trimmed FITS path.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Delete the raw coadd after a verified trim.
    #[arg(long)]
    pub delete_original: bool,
}

pub fn run_trim(args: TrimArgs, config: &Config) -> Result<()> {
    let catalog = load_catalog(&args.csv, &args.ra_col, &args.dec_col, config)?;

    let summary = trim_coadd(
        &args.coadd,
        &catalog.coords(),
        &TrimOptions {
            max_arcsec: args.max_arcsec,
            report_arcsec: args.report_arcsec,
            out: args.out.clone(),
            delete_original: args.delete_original,
            ..TrimOptions::default()
        },
    )?;

    println!("coadd rows: {}", summary.coadd_rows);
    println!("matched rows (<= {}\"): {}", args.max_arcsec, summary.kept);
    println!(
        "matched rows (<= {}\"): {}",
        args.report_arcsec, summary.report_matches
    );
    println!("wrote: {}", summary.output.display());
    if summary.deleted_original {
        println!("deleted original: {}", args.coadd.display());
    }
    Ok(())
}

#[derive(Args)]
pub struct BatchArgs {
    /// Directory containing coadd-*.fits files.
    pub root: PathBuf,

    /// Catalog CSV with RA/Dec columns.
    pub csv: Option<PathBuf>,

    /// RA column name.
    #[arg(long)]
    pub ra_col: Option<String>,

    /// Dec column name.
    #[arg(long)]
    pub dec_col: Option<String>,

    /// Match radius (arcsec) for kept rows.
    #[arg(long, default_value_t = 1.0)]
    pub max_arcsec: f64,

    /// Looser radius (arcsec) counted for reporting only.
    #[arg(long, default_value_t = 3.0)]
    pub report_arcsec: f64,

    /// Delete each raw coadd after a verified trim.
    #[arg(long)]
    pub delete_original: bool,
}

pub fn run_batch(args: BatchArgs, config: &Config) -> Result<()> {
    let catalog = load_catalog(&args.csv, &args.ra_col, &args.dec_col, config)?;

    let summary = process_batch(
        &args.root,
        &catalog.coords(),
        &TrimOptions {
            max_arcsec: args.max_arcsec,
            report_arcsec: args.report_arcsec,
            out: None,
            delete_original: args.delete_original,
            ..TrimOptions::default()
        },
    )?;

    if summary.processed.is_empty() && summary.skipped == 0 {
        println!("No coadd files found under {}", args.root.display());
        return Ok(());
    }

    for trim in &summary.processed {
        println!(
            "{}: kept {}/{} rows",
            trim.output.display(),
            trim.kept,
            trim.coadd_rows
        );
    }
    println!(
        "Processed {} files ({} already trimmed)",
        summary.processed.len(),
        summary.skipped
    );
    Ok(())
}
