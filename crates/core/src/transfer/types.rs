//! Types for transfer submissions.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or submitting transfers.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("transfer API error: {0}")]
    ApiError(String),

    #[error("request timeout")]
    Timeout,

    /// The destination path cannot be used as given.
    #[error("invalid destination path '{path}': {reason}")]
    InvalidDestination { path: String, reason: String },

    /// The pixel-id list file is unusable.
    #[error("cannot read pixel ids from {path}: {reason}")]
    HealpixFile { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronisation level passed through to the transfer service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncLevel {
    /// Transfer only files absent at the destination.
    #[default]
    Exists,
    /// Also re-transfer when sizes differ.
    Size,
    /// Also re-transfer when the source is newer.
    Mtime,
    /// Re-transfer when checksums differ.
    Checksum,
}

impl SyncLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLevel::Exists => "exists",
            SyncLevel::Size => "size",
            SyncLevel::Mtime => "mtime",
            SyncLevel::Checksum => "checksum",
        }
    }

    /// Numeric level used by the transfer REST API.
    pub fn api_level(&self) -> u8 {
        match self {
            SyncLevel::Exists => 0,
            SyncLevel::Size => 1,
            SyncLevel::Mtime => 2,
            SyncLevel::Checksum => 3,
        }
    }
}

impl FromStr for SyncLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exists" => Ok(SyncLevel::Exists),
            "size" => Ok(SyncLevel::Size),
            "mtime" => Ok(SyncLevel::Mtime),
            "checksum" => Ok(SyncLevel::Checksum),
            other => Err(format!(
                "unknown sync level '{other}' (expected exists, size, mtime or checksum)"
            )),
        }
    }
}

/// One file to move: remote source path to destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub source: String,
    pub destination: String,
}

/// One batch submitted to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSpec {
    /// Human-readable label shown by the service.
    pub label: String,
    pub sync_level: SyncLevel,
    pub verify_checksum: bool,
    pub preserve_timestamp: bool,
    /// Skip unreadable source files instead of failing the whole batch.
    pub skip_source_errors: bool,
    pub items: Vec<TransferItem>,
}

/// Acknowledgement of one submitted batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Task id assigned by the service; usable to monitor the transfer.
    pub task_id: String,
    pub label: String,
    pub items: usize,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_level_parse_roundtrip() {
        for level in [
            SyncLevel::Exists,
            SyncLevel::Size,
            SyncLevel::Mtime,
            SyncLevel::Checksum,
        ] {
            assert_eq!(level.as_str().parse::<SyncLevel>().unwrap(), level);
        }
        assert!("bogus".parse::<SyncLevel>().is_err());
    }

    #[test]
    fn sync_level_api_values() {
        assert_eq!(SyncLevel::Exists.api_level(), 0);
        assert_eq!(SyncLevel::Checksum.api_level(), 3);
    }

    #[test]
    fn receipt_serialization() {
        let receipt = TransferReceipt {
            task_id: "task-1".to_string(),
            label: "batch 1/2".to_string(),
            items: 500,
            submitted_at: Utc::now(),
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let parsed: TransferReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.task_id, "task-1");
        assert_eq!(parsed.items, 500);
    }
}
