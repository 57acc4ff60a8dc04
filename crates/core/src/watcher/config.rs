//! Watcher configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the ingest watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// How often to rescan the directory (seconds).
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,

    /// Minimum file age before processing (seconds). Guards against
    /// trimming a file the transfer service is still writing.
    #[serde(default = "default_min_age_seconds")]
    pub min_age_seconds: u64,

    /// Delete the raw coadd after a verified trim.
    #[serde(default)]
    pub delete_original: bool,

    /// Move arriving files to `test_output_dir` instead of trimming them.
    #[serde(default)]
    pub test_mode: bool,

    /// Destination directory for test-mode moves.
    #[serde(default = "default_test_output_dir")]
    pub test_output_dir: PathBuf,
}

fn default_poll_seconds() -> u64 {
    5
}

fn default_min_age_seconds() -> u64 {
    30
}

fn default_test_output_dir() -> PathBuf {
    PathBuf::from("watcher_test")
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            min_age_seconds: default_min_age_seconds(),
            delete_original: false,
            test_mode: false,
            test_output_dir: default_test_output_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_seconds, 5);
        assert_eq!(config.min_age_seconds, 30);
        assert!(!config.delete_original);
        assert!(!config.test_mode);
    }

    #[test]
    fn deserialize_minimal() {
        let config: WatcherConfig = toml::from_str("poll_seconds = 1").unwrap();
        assert_eq!(config.poll_seconds, 1);
        assert_eq!(config.min_age_seconds, 30);
    }

    #[test]
    fn deserialize_full() {
        let config: WatcherConfig = toml::from_str(
            r#"
            poll_seconds = 2
            min_age_seconds = 0
            delete_original = true
            test_mode = true
            test_output_dir = "/tmp/watch-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.min_age_seconds, 0);
        assert!(config.delete_original);
        assert!(config.test_mode);
        assert_eq!(config.test_output_dir, PathBuf::from("/tmp/watch-test"));
    }
}
