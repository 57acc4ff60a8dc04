//! Configuration loading via figment.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment keys use a `DESIPIX_` prefix and `__` as the section
/// separator, e.g. `DESIPIX_WATCHER__POLL_SECONDS=1` or
/// `DESIPIX_TRANSFER__GLOBUS__TOKEN=...`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("DESIPIX_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from a TOML string (useful for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_str_valid() {
        let config = load_config_from_str(
            r#"
            [watcher]
            poll_seconds = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.watcher.poll_seconds, 9);
    }

    #[test]
    fn load_from_str_invalid() {
        let result = load_config_from_str("watcher = 3");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [catalog]
            path = "cat.csv"

            [watcher]
            min_age_seconds = 0
            "#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.catalog.path.to_str().unwrap(), "cat.csv");
        assert_eq!(config.watcher.min_age_seconds, 0);
    }
}
