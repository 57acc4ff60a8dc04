//! Prometheus counters for the long-running paths.
//!
//! The watcher and the transfer requester bump these; the CLI reports them
//! in the shutdown log line.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, Opts, Registry};

/// Coadd files trimmed by the watcher or batch processor.
pub static COADDS_TRIMMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(Opts::new(
        "desipix_coadds_trimmed_total",
        "Coadd files trimmed to matched rows",
    ))
    .unwrap()
});

/// Spectra rows kept across all trims.
pub static TRIM_ROWS_KEPT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(Opts::new(
        "desipix_trim_rows_kept_total",
        "FIBERMAP rows kept by trimming",
    ))
    .unwrap()
});

/// Transfer batches submitted to the transfer service.
pub static TRANSFER_BATCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(Opts::new(
        "desipix_transfer_batches_total",
        "Transfer batches submitted",
    ))
    .unwrap()
});

/// Individual transfer items submitted.
pub static TRANSFER_ITEMS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(Opts::new(
        "desipix_transfer_items_total",
        "Transfer items submitted",
    ))
    .unwrap()
});

/// Cached tilepix indexes rejected as corrupt.
pub static TILEPIX_CACHE_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(Opts::new(
        "desipix_tilepix_cache_rejected_total",
        "Cached tilepix indexes rejected as corrupt",
    ))
    .unwrap()
});

/// Register all counters on a registry.
pub fn register(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(COADDS_TRIMMED.clone()))?;
    registry.register(Box::new(TRIM_ROWS_KEPT.clone()))?;
    registry.register(Box::new(TRANSFER_BATCHES.clone()))?;
    registry.register(Box::new(TRANSFER_ITEMS.clone()))?;
    registry.register(Box::new(TILEPIX_CACHE_REJECTED.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_once() {
        let registry = Registry::new();
        register(&registry).unwrap();
        assert!(register(&registry).is_err(), "double registration");
    }

    #[test]
    fn counters_increment() {
        let before = COADDS_TRIMMED.get();
        COADDS_TRIMMED.inc();
        assert_eq!(COADDS_TRIMMED.get(), before + 1);
    }
}
