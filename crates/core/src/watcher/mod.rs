//! Ingest watcher: poll a directory for arriving coadd files and trim each
//! one against the catalog, one file at a time.

mod batch;
mod config;
mod runner;

pub use batch::{generate_test_files, process_batch, BatchSummary};
pub use config::WatcherConfig;
pub use runner::{CoaddWatcher, WatcherError, WatcherStats};
