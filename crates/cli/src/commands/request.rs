//! `request` subcommand.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use desipix_core::config::TransferBackend;
use desipix_core::tilepix::TilepixSource;
use desipix_core::transfer::{
    build_plan, read_healpix_ids, submit_plan, GlobusTransferClient, RequestOptions, SyncLevel,
    TransferService,
};
use desipix_core::Config;

#[derive(Args)]
pub struct RequestArgs {
    /// Destination path on the endpoint (absolute).
    pub destination_path: String,

    /// Destination endpoint id (overrides config).
    #[arg(long)]
    pub destination_endpoint: Option<String>,

    /// Surveys to transfer.
    #[arg(long, num_args = 1.., default_values_t = vec!["main".to_string()])]
    pub surveys: Vec<String>,

    /// PROGRAM values to include (e.g. dark bright).
    #[arg(long, num_args = 1..)]
    pub programs: Vec<String>,

    /// Pixel ids to transfer.
    #[arg(long, num_args = 1..)]
    pub healpix: Vec<u64>,

    /// File with pixel ids (one per line, # comments allowed).
    #[arg(long)]
    pub healpix_file: Option<PathBuf>,

    /// Extra remote files to transfer in the first batch.
    #[arg(long, num_args = 1..)]
    pub extra_files: Vec<String>,

    /// Local cache path for the tilepix index (overrides config).
    #[arg(long)]
    pub tilepix_cache: Option<PathBuf>,

    /// Files per batch.
    #[arg(long, default_value_t = 500)]
    pub batch_size: usize,

    /// Delay in seconds between batch submissions.
    #[arg(long, default_value_t = 5)]
    pub batch_delay: u64,

    /// Maximum number of batches to submit.
    #[arg(long)]
    pub max_batches: Option<usize>,

    /// Sync level: exists, size, mtime or checksum.
    #[arg(long, default_value = "exists")]
    pub sync_level: SyncLevel,

    /// Ask the service to verify checksums after transfer.
    #[arg(long)]
    pub verify_checksum: bool,

    /// Fail a batch when a source file is missing.
    #[arg(long)]
    pub fail_on_missing_source: bool,

    /// Build and print the plan without submitting anything.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: RequestArgs, config: &Config) -> Result<()> {
    let Some(transfer_config) = &config.transfer else {
        bail!("no [transfer] section in config; the request command needs one");
    };

    // Pixel filter: inline ids and the id file combine.
    let mut healpix: BTreeSet<u64> = args.healpix.iter().copied().collect();
    if let Some(file) = &args.healpix_file {
        healpix.extend(read_healpix_ids(file)?);
    }

    let options = RequestOptions {
        surveys: args.surveys.clone(),
        programs: args.programs.clone(),
        healpix: (!healpix.is_empty()).then_some(healpix),
        batch_size: args.batch_size,
        batch_delay: Duration::from_secs(args.batch_delay),
        max_batches: args.max_batches,
        extra_files: args.extra_files.clone(),
        sync_level: args.sync_level,
        verify_checksum: args.verify_checksum,
        fail_on_missing_source: args.fail_on_missing_source,
    };

    let cache = args
        .tilepix_cache
        .clone()
        .or_else(|| transfer_config.tilepix_cache.clone());
    let source = TilepixSource::new(transfer_config.tilepix_url.clone())
        .with_cache(cache)
        .with_retries(transfer_config.tilepix_retries)
        .with_timeout(Duration::from_secs(transfer_config.tilepix_timeout_secs));

    println!("Loading DESI tilepix index...");
    let index = source.load().await.context(
        "tilepix index unavailable; try again later or pass --tilepix-cache \
         with a known-good local copy",
    )?;

    let plan = build_plan(&index, &args.destination_path, &options)?;
    println!(
        "Planned {} files in {} batches of up to {}",
        plan.total_items(),
        plan.batches.len(),
        args.batch_size
    );

    if args.dry_run {
        for batch in &plan.batches {
            println!("{} ({} items)", batch.label, batch.items.len());
            for item in &batch.items {
                println!("  {} -> {}", item.source, item.destination);
            }
        }
        return Ok(());
    }

    let service: Box<dyn TransferService> = match transfer_config.backend {
        TransferBackend::Globus => {
            let mut globus = transfer_config
                .globus
                .clone()
                .context("transfer.backend = \"globus\" but no [transfer.globus] section")?;
            if let Some(endpoint) = &args.destination_endpoint {
                globus.destination_endpoint = endpoint.clone();
            }
            Box::new(GlobusTransferClient::new(globus)?)
        }
    };

    service
        .validate()
        .await
        .context("transfer service validation failed")?;

    let receipts = submit_plan(service.as_ref(), plan, Duration::from_secs(args.batch_delay))
        .await
        .context("transfer submission failed")?;

    println!("All batches submitted successfully!");
    for (i, receipt) in receipts.iter().enumerate() {
        println!(
            "  Batch {}: https://app.globus.org/activity/{} ({} items)",
            i + 1,
            receipt.task_id,
            receipt.items
        );
    }
    Ok(())
}
