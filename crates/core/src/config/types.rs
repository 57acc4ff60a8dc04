//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogColumns;
use crate::tilepix::TILEPIX_URL;
use crate::transfer::GlobusConfig;
use crate::watcher::WatcherConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub transfer: Option<TransferSection>,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Catalog defaults used when the CLI flags leave them unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSection {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub columns: CatalogColumns,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/DESI_chandra_crossmatch_1arcsec_healpix.csv")
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            columns: CatalogColumns::default(),
        }
    }
}

/// Per-pixel match store location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
    /// Override of the RA dataset path inside each pixel file.
    #[serde(default)]
    pub ra_dataset: Option<String>,
    /// Override of the Dec dataset path inside each pixel file.
    #[serde(default)]
    pub dec_dataset: Option<String>,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("data/desi_crossmatches")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            ra_dataset: None,
            dec_dataset: None,
        }
    }
}

/// Available transfer backends.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferBackend {
    Globus,
}

/// Transfer requester configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferSection {
    /// Transfer backend type.
    pub backend: TransferBackend,
    /// Globus-specific configuration (required when backend = "globus").
    #[serde(default)]
    pub globus: Option<GlobusConfig>,
    /// URL of the tile/pixel index.
    #[serde(default = "default_tilepix_url")]
    pub tilepix_url: String,
    /// Local cache path for the index.
    #[serde(default)]
    pub tilepix_cache: Option<PathBuf>,
    /// Download retries for the index.
    #[serde(default = "default_tilepix_retries")]
    pub tilepix_retries: u32,
    /// Download timeout for the index (seconds).
    #[serde(default = "default_tilepix_timeout")]
    pub tilepix_timeout_secs: u64,
}

fn default_tilepix_url() -> String {
    TILEPIX_URL.to_string()
}

fn default_tilepix_retries() -> u32 {
    3
}

fn default_tilepix_timeout() -> u64 {
    30
}
