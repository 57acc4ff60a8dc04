//! `augment` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use desipix_core::{augment_catalog, Config};

use super::catalog_columns;

#[derive(Args)]
pub struct AugmentArgs {
    /// Input catalog CSV.
    pub csv: PathBuf,

    /// RA column name.
    #[arg(long)]
    pub ra_col: Option<String>,

    /// Dec column name.
    #[arg(long)]
    pub dec_col: Option<String>,

    /// Output CSV path (default: <input>.with_pix64.csv).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: AugmentArgs, config: &Config) -> Result<()> {
    let columns = catalog_columns(&args.ra_col, &args.dec_col, config);
    let summary = augment_catalog(&args.csv, args.out.as_deref(), &columns)?;
    println!("Wrote {} ({} rows)", summary.output.display(), summary.rows);
    Ok(())
}
