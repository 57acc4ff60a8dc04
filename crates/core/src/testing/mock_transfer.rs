//! Recording mock of the transfer service.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::transfer::{TransferError, TransferReceipt, TransferService, TransferSpec};

/// Transfer service that records submissions instead of moving files.
#[derive(Clone, Default)]
pub struct MockTransferService {
    submissions: Arc<Mutex<Vec<TransferSpec>>>,
    fail_submissions: Arc<AtomicBool>,
    counter: Arc<AtomicU64>,
}

impl MockTransferService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent submissions fail with an API error.
    pub fn set_fail(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Specs submitted so far.
    pub async fn submissions(&self) -> Vec<TransferSpec> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl TransferService for MockTransferService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, spec: TransferSpec) -> Result<TransferReceipt, TransferError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(TransferError::ApiError("mock failure".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let receipt = TransferReceipt {
            task_id: format!("mock-task-{n}"),
            label: spec.label.clone(),
            items: spec.items.len(),
            submitted_at: Utc::now(),
        };
        self.submissions.lock().await.push(spec);
        Ok(receipt)
    }

    async fn validate(&self) -> Result<(), TransferError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{SyncLevel, TransferItem};

    fn spec(label: &str) -> TransferSpec {
        TransferSpec {
            label: label.to_string(),
            sync_level: SyncLevel::Exists,
            verify_checksum: false,
            preserve_timestamp: true,
            skip_source_errors: true,
            items: vec![TransferItem {
                source: "/src/a.fits".to_string(),
                destination: "/dest/a.fits".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn records_submissions_in_order() {
        let mock = MockTransferService::new();
        let first = mock.submit(spec("one")).await.unwrap();
        let second = mock.submit(spec("two")).await.unwrap();

        assert_eq!(first.task_id, "mock-task-0");
        assert_eq!(second.task_id, "mock-task-1");

        let submissions = mock.submissions().await;
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].label, "one");
    }

    #[tokio::test]
    async fn can_simulate_failures() {
        let mock = MockTransferService::new();
        mock.set_fail(true);
        assert!(mock.submit(spec("doomed")).await.is_err());
        mock.set_fail(false);
        assert!(mock.submit(spec("fine")).await.is_ok());
    }
}
