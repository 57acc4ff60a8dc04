mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use desipix_core::{load_config, validate_config, Config};

#[derive(Parser)]
#[command(
    name = "desipix",
    version,
    about = "DESI coadd acquisition and crossmatch ingest toolkit"
)]
struct Cli {
    /// Config file with defaults for paths, columns and the transfer
    /// service. Flags override config values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count catalog rows matched by the per-pixel store.
    Count(commands::count::CountArgs),

    /// Count catalog rows matched by locally downloaded coadd files.
    CountLocal(commands::count::CountLocalArgs),

    /// Append pix64 and pix64_group columns to a catalog.
    Augment(commands::augment::AugmentArgs),

    /// Deduce which (NSIDE, ordering) produced the catalog's pixel column.
    DeduceScheme(commands::scheme::DeduceArgs),

    /// Submit transfer requests for coadds covering the requested pixels.
    Request(commands::request::RequestArgs),

    /// Extract spectra and identifiers from a coadd into HDF5.
    Extract(commands::extract::ExtractArgs),

    /// Trim a coadd to rows matched by the catalog.
    Trim(commands::trim::TrimArgs),

    /// Trim every coadd under a directory once.
    Batch(commands::trim::BatchArgs),

    /// Watch a directory and trim coadds as they arrive.
    Watch(commands::watch::WatchArgs),

    /// Generate dummy arrivals for watcher testing.
    GenTestFiles(commands::watch::GenTestFilesArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            let config = load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            validate_config(&config).context("configuration validation failed")?;
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Count(args) => commands::count::run_count(args, &config),
        Commands::CountLocal(args) => commands::count::run_count_local(args, &config),
        Commands::Augment(args) => commands::augment::run(args, &config),
        Commands::DeduceScheme(args) => commands::scheme::run(args, &config),
        Commands::Request(args) => commands::request::run(args, &config).await,
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Trim(args) => commands::trim::run_trim(args, &config),
        Commands::Batch(args) => commands::trim::run_batch(args, &config),
        Commands::Watch(args) => commands::watch::run_watch(args, &config).await,
        Commands::GenTestFiles(args) => commands::watch::run_gen_test_files(args).await,
    }
}
