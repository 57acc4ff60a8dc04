//! Globus transfer REST client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::traits::TransferService;
use super::types::{TransferError, TransferReceipt, TransferSpec};

/// DESI public data collection endpoint.
pub const DESI_SOURCE_ENDPOINT: &str = "6b4e1f6a-e600-11ed-9b9b-c9bb788c490e";

const DEFAULT_BASE_URL: &str = "https://transfer.api.globus.org/v0.10";

fn default_source_endpoint() -> String {
    DESI_SOURCE_ENDPOINT.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Globus client configuration.
///
/// The access token is obtained out-of-band (a native-app login or a saved
/// refresh flow) and supplied via config or the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobusConfig {
    /// Destination endpoint id.
    pub destination_endpoint: String,
    /// Source endpoint id (default: the DESI public collection).
    #[serde(default = "default_source_endpoint")]
    pub source_endpoint: String,
    /// Transfer API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for the transfer API.
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// REST implementation of [`TransferService`].
pub struct GlobusTransferClient {
    client: Client,
    config: GlobusConfig,
}

#[derive(Deserialize)]
struct SubmissionId {
    value: String,
}

#[derive(Deserialize)]
struct TransferResult {
    task_id: String,
}

impl GlobusTransferClient {
    pub fn new(config: GlobusConfig) -> Result<Self, TransferError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TransferError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn map_send_error(e: reqwest::Error) -> TransferError {
        if e.is_timeout() {
            TransferError::Timeout
        } else if e.is_connect() {
            TransferError::ConnectionFailed(e.to_string())
        } else {
            TransferError::ApiError(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransferError> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(TransferError::AuthenticationFailed(
                    body.chars().take(200).collect(),
                ))
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(TransferError::ApiError(format!(
                    "HTTP {status}: {}",
                    body.chars().take(200).collect::<String>()
                )))
            }
            _ => Ok(response),
        }
    }

    /// Each submission needs a fresh server-issued submission id, which
    /// makes retried POSTs idempotent on the service side.
    async fn submission_id(&self) -> Result<String, TransferError> {
        let url = format!("{}/submission_id", self.base_url());
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let id: SubmissionId = response
            .json()
            .await
            .map_err(|e| TransferError::ApiError(e.to_string()))?;
        Ok(id.value)
    }
}

#[async_trait]
impl TransferService for GlobusTransferClient {
    fn name(&self) -> &str {
        "globus"
    }

    async fn submit(&self, spec: TransferSpec) -> Result<TransferReceipt, TransferError> {
        let submission_id = self.submission_id().await?;
        debug!(submission_id, items = spec.items.len(), "submitting transfer");

        let data: Vec<serde_json::Value> = spec
            .items
            .iter()
            .map(|item| {
                json!({
                    "DATA_TYPE": "transfer_item",
                    "source_path": item.source,
                    "destination_path": item.destination,
                })
            })
            .collect();

        let body = json!({
            "DATA_TYPE": "transfer",
            "submission_id": submission_id,
            "source_endpoint": self.config.source_endpoint,
            "destination_endpoint": self.config.destination_endpoint,
            "label": spec.label,
            "sync_level": spec.sync_level.api_level(),
            "verify_checksum": spec.verify_checksum,
            "preserve_timestamp": spec.preserve_timestamp,
            "fail_on_quota_errors": true,
            "skip_source_errors": spec.skip_source_errors,
            "DATA": data,
        });

        let url = format!("{}/transfer", self.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let result: TransferResult = response
            .json()
            .await
            .map_err(|e| TransferError::ApiError(e.to_string()))?;

        info!(
            task_id = %result.task_id,
            label = %spec.label,
            items = spec.items.len(),
            "transfer submitted; monitor at https://app.globus.org/activity/{}",
            result.task_id
        );

        Ok(TransferReceipt {
            task_id: result.task_id,
            label: spec.label,
            items: spec.items.len(),
            submitted_at: Utc::now(),
        })
    }

    async fn validate(&self) -> Result<(), TransferError> {
        // A submission id round trip exercises both connectivity and auth.
        self.submission_id().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config: GlobusConfig = toml::from_str(
            r#"
            destination_endpoint = "dest-endpoint"
            token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.source_endpoint, DESI_SOURCE_ENDPOINT);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn unreachable_api_maps_to_connection_error() {
        let client = GlobusTransferClient::new(GlobusConfig {
            destination_endpoint: "dest".to_string(),
            source_endpoint: DESI_SOURCE_ENDPOINT.to_string(),
            base_url: "http://127.0.0.1:1/v0.10".to_string(),
            token: "token".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let err = client.validate().await.unwrap_err();
        assert!(
            matches!(
                err,
                TransferError::ConnectionFailed(_) | TransferError::Timeout
            ),
            "got {err}"
        );
    }
}
