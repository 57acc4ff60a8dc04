pub mod catalog;
pub mod coadd;
pub mod config;
pub mod crossmatch;
pub mod healpix;
pub mod metrics;
pub mod store;
pub mod testing;
pub mod tilepix;
pub mod transfer;
pub mod watcher;

pub use catalog::{
    augment_catalog, deduce_scheme, unique_coadd_pixels, verify_scheme, write_pixel_lists,
    Catalog, CatalogColumns, CatalogError, SchemeReport, DEFAULT_CONSISTENCY_THRESHOLD,
};
pub use coadd::{
    count_local_matches, extract_coadd, list_coadd_files, trim_coadd, trimmed_path, CoaddError,
    CoaddName, CoaddReader, ExtractOptions, LocalCountOptions, TrimOptions,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use crossmatch::{count_store_matches, CountError, CountReport, SkyCoords};
pub use healpix::{
    catalog_pixel, coadd_pixel, nested_center, pixel_group, Ordering, PixelScheme, CATALOG_NSIDE,
    COADD_NSIDE,
};
pub use store::{MatchStore, StoreError};
pub use tilepix::{TilepixError, TilepixFilter, TilepixIndex, TilepixSource, TILEPIX_URL};
pub use transfer::{
    build_plan, normalize_destination, read_healpix_ids, submit_plan, GlobusConfig,
    GlobusTransferClient, RequestOptions, SyncLevel, TransferError, TransferService,
};
pub use watcher::{
    generate_test_files, process_batch, CoaddWatcher, WatcherConfig, WatcherError,
};
