//! Toolkit configuration: a TOML file merged with environment overrides.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    CatalogSection, Config, ConfigError, StoreSection, TransferBackend, TransferSection,
};
pub use validate::validate_config;
