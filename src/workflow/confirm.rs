use crate::error::{Result, WorkflowError};
use crate::workflow::capability::{ChainState, ConfirmationRecord, ConfirmationStatus, TransactionHandle};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Waits for submitted transactions to be mined.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationWaiter {
    poll_interval: Duration,
}

impl Default for ConfirmationWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ConfirmationWaiter {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Wait until `handle` is mined or `timeout` elapses.
    ///
    /// Between lookups the waiter parks on the chain's new-block signal; when
    /// the poller is gone it falls back to sleeping `poll_interval`.
    pub async fn wait(
        &self,
        chain: &dyn ChainState,
        handle: TransactionHandle,
        timeout: Duration,
    ) -> Result<ConfirmationRecord> {
        let hash = handle.hash;
        let started = tokio::time::Instant::now();
        let poll = async {
            loop {
                match chain.confirmation(hash).await {
                    Ok(ConfirmationStatus::Mined(record)) => return Ok(record),
                    Ok(ConfirmationStatus::Reverted) => {
                        return Err(WorkflowError::Reverted { hash })
                    }
                    Ok(ConfirmationStatus::Pending) => {}
                    // Already broadcast: a failed lookup is retried until the timeout.
                    Err(err) => {
                        tracing::warn!(tx_hash = %hash, error = %err, "receipt lookup failed, retrying")
                    }
                }
                if !chain.block_advanced().await {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => {
                if let Ok(record) = &result {
                    tracing::debug!(
                        tx_hash = %hash,
                        block = record.block_number,
                        wait_ms = started.elapsed().as_millis() as u64,
                        "transaction mined"
                    );
                }
                result
            }
            Err(_) => {
                tracing::warn!(
                    tx_hash = %hash,
                    timeout_secs = timeout.as_secs(),
                    "transaction not mined before timeout"
                );
                Err(WorkflowError::ConfirmationTimeout { hash })
            }
        }
    }
}
