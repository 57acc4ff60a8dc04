//! `watch` and `gen-test-files` subcommands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::signal;
use tracing::info;

use desipix_core::metrics;
use desipix_core::{generate_test_files, CoaddWatcher, Config, TrimOptions, WatcherConfig};

use super::{catalog_columns, catalog_path};

#[derive(Args)]
pub struct WatchArgs {
    /// Directory to watch for coadd-*.fits files.
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

    /// Seconds between directory scans (overrides config).
    #[arg(long)]
    pub poll_seconds: Option<u64>,

    /// Minimum file age in seconds before processing (overrides config).
    #[arg(long)]
    pub min_age_seconds: Option<u64>,

    /// Delete each raw coadd after a verified trim.
    #[arg(long)]
    pub delete_original: bool,

    /// Move arrivals aside instead of trimming them.
    #[arg(long)]
    pub test_mode: bool,

    /// Destination directory for test-mode moves.
    #[arg(long)]
    pub test_output_dir: Option<PathBuf>,
}

pub async fn run_watch(args: WatchArgs, config: &Config) -> Result<()> {
    let mut watcher_config = config.watcher.clone();
    if let Some(poll) = args.poll_seconds {
        watcher_config.poll_seconds = poll;
    }
    if let Some(age) = args.min_age_seconds {
        watcher_config.min_age_seconds = age;
    }
    if args.delete_original {
        watcher_config.delete_original = true;
    }
    if args.test_mode {
        watcher_config.test_mode = true;
    }
    if let Some(dir) = &args.test_output_dir {
        watcher_config.test_output_dir = dir.clone();
    }

    let catalog = catalog_path(&args.csv, config);
    let columns = catalog_columns(&args.ra_col, &args.dec_col, config);

    let watcher = CoaddWatcher::new(
        &args.root,
        &catalog,
        &columns,
        TrimOptions {
            max_arcsec: args.max_arcsec,
            report_arcsec: args.report_arcsec,
            out: None,
            delete_original: watcher_config.delete_original,
            ..TrimOptions::default()
        },
        watcher_config,
    )?;

    let shutdown = watcher.shutdown_sender();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received; stopping watcher");
        let _ = shutdown.send(());
    });

    let stats = watcher.run().await?;
    info!(
        trimmed = stats.trimmed,
        moved = stats.moved,
        failed = stats.failed,
        total_rows_kept = metrics::TRIM_ROWS_KEPT.get(),
        "watcher finished"
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Args)]
pub struct GenTestFilesArgs {
    /// Directory to write dummy files into.
    pub root: PathBuf,

    /// Number of files to create.
    #[arg(long, default_value_t = 5)]
    pub count: u32,

    /// Seconds between file creations.
    #[arg(long, default_value_t = 1.0)]
    pub interval: f64,
}

pub async fn run_gen_test_files(args: GenTestFilesArgs) -> Result<()> {
    let written = generate_test_files(
        &args.root,
        args.count,
        Duration::from_secs_f64(args.interval),
    )
    .await?;
    for path in &written {
        println!("created {}", path.display());
    }
    Ok(())
}
