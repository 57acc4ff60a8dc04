//! Subcommand implementations.

pub mod augment;
pub mod count;
pub mod extract;
pub mod request;
pub mod scheme;
pub mod trim;
pub mod watch;

use std::path::PathBuf;

use desipix_core::{Catalog, CatalogColumns, Config};

/// Resolve the catalog path: flag wins over config default.
pub(crate) fn catalog_path(flag: &Option<PathBuf>, config: &Config) -> PathBuf {
    flag.clone().unwrap_or_else(|| config.catalog.path.clone())
}

/// Resolve catalog columns: flags win over config defaults.
pub(crate) fn catalog_columns(
    ra_col: &Option<String>,
    dec_col: &Option<String>,
    config: &Config,
) -> CatalogColumns {
    let mut columns = config.catalog.columns.clone();
    if let Some(ra) = ra_col {
        columns.ra = ra.clone();
    }
    if let Some(dec) = dec_col {
        columns.dec = dec.clone();
    }
    columns
}

/// Load the catalog named by a flag or the config default.
pub(crate) fn load_catalog(
    flag: &Option<PathBuf>,
    ra_col: &Option<String>,
    dec_col: &Option<String>,
    config: &Config,
) -> anyhow::Result<Catalog> {
    let path = catalog_path(flag, config);
    let columns = catalog_columns(ra_col, dec_col, config);
    Ok(Catalog::load(&path, &columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use desipix_core::load_config_from_str;

    #[test]
    fn flag_overrides_config_catalog_path() {
        let config = load_config_from_str(
            r#"
            [catalog]
            path = "from-config.csv"
            "#,
        )
        .unwrap();
        assert_eq!(
            catalog_path(&None, &config),
            PathBuf::from("from-config.csv")
        );
        assert_eq!(
            catalog_path(&Some(PathBuf::from("from-flag.csv")), &config),
            PathBuf::from("from-flag.csv")
        );
    }

    #[test]
    fn column_flags_override_config() {
        let config = load_config_from_str(
            r#"
            [catalog.columns]
            ra = "RA_CFG"
            "#,
        )
        .unwrap();

        let columns = catalog_columns(&None, &None, &config);
        assert_eq!(columns.ra, "RA_CFG");
        assert_eq!(columns.dec, "DEC_DESI");

        let columns = catalog_columns(&Some("RA_FLAG".to_string()), &None, &config);
        assert_eq!(columns.ra, "RA_FLAG");
    }

    #[test]
    fn load_catalog_resolves_and_loads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cat.csv");
        std::fs::write(&path, "RA_DESI,DEC_DESI\n10.0,-2.0\n").unwrap();

        let catalog = load_catalog(&Some(path), &None, &None, &Config::default()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
