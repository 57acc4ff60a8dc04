//! Trait seam for the transfer service.

use async_trait::async_trait;

use super::types::{TransferError, TransferReceipt, TransferSpec};

/// A service that can move files from a remote store to a destination.
///
/// Authentication is the implementation's concern and happens out-of-band;
/// callers only build specs and collect receipts.
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Name of this implementation.
    fn name(&self) -> &str;

    /// Submit one batch; returns the service's task id.
    async fn submit(&self, spec: TransferSpec) -> Result<TransferReceipt, TransferError>;

    /// Check that the service is reachable and the credentials work.
    async fn validate(&self) -> Result<(), TransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::SyncLevel;
    use chrono::Utc;

    struct NullService;

    #[async_trait]
    impl TransferService for NullService {
        fn name(&self) -> &str {
            "null"
        }

        async fn submit(&self, spec: TransferSpec) -> Result<TransferReceipt, TransferError> {
            Ok(TransferReceipt {
                task_id: "task-0".to_string(),
                label: spec.label,
                items: spec.items.len(),
                submitted_at: Utc::now(),
            })
        }

        async fn validate(&self) -> Result<(), TransferError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn trait_object_usable() {
        let service: Box<dyn TransferService> = Box::new(NullService);
        let receipt = service
            .submit(TransferSpec {
                label: "test".to_string(),
                sync_level: SyncLevel::Exists,
                verify_checksum: false,
                preserve_timestamp: true,
                skip_source_errors: true,
                items: vec![],
            })
            .await
            .unwrap();
        assert_eq!(receipt.task_id, "task-0");
    }
}
