//! Configuration validation.

use super::{types::Config, ConfigError, TransferBackend};

/// Validate configuration.
/// Currently validates:
/// - Watcher intervals are non-zero
/// - Transfer backend has its backend-specific section and credentials
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.watcher.poll_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "watcher.poll_seconds cannot be 0".to_string(),
        ));
    }

    if let Some(transfer) = &config.transfer {
        if transfer.tilepix_retries == 0 {
            return Err(ConfigError::ValidationError(
                "transfer.tilepix_retries cannot be 0".to_string(),
            ));
        }
        match transfer.backend {
            TransferBackend::Globus => {
                let Some(globus) = &transfer.globus else {
                    return Err(ConfigError::ValidationError(
                        "transfer.backend = \"globus\" requires a [transfer.globus] section"
                            .to_string(),
                    ));
                };
                if globus.destination_endpoint.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "transfer.globus.destination_endpoint cannot be empty".to_string(),
                    ));
                }
                if globus.token.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "transfer.globus.token cannot be empty".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}
