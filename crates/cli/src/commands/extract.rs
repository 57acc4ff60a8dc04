//! `extract` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use desipix_core::{extract_coadd, ExtractOptions};

#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the coadd FITS file.
    #[arg(long)]
    pub coadd: PathBuf,

    /// Output HDF5 path.
    #[arg(long)]
    pub out: PathBuf,

    /// Comma-separated list of bands to extract.
    #[arg(long, default_value = "B,R,Z")]
    pub bands: String,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let bands: Vec<String> = args
        .bands
        .split(',')
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty())
        .collect();

    let summary = extract_coadd(&args.coadd, &args.out, &ExtractOptions { bands })?;
    println!(
        "Wrote {} ({} targets, bands: {})",
        summary.output.display(),
        summary.targets,
        summary.bands.join(",")
    );
    Ok(())
}
