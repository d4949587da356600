use crate::error::{Result, WorkflowError};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Signing provider bound to one wallet.
#[derive(Clone)]
pub struct RpcClient {
    pub provider: DynProvider,
    pub owner: Address,
}

impl RpcClient {
    pub fn connect(url: &str, wallet: PrivateKeySigner) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|err| WorkflowError::Transport(format!("invalid rpc url {url}: {err}")))?;
        let owner = wallet.address();
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(parsed)
            .erased();
        Ok(Self {
            provider,
            owner,
        })
    }
}

pub async fn eth_call(client: &RpcClient, to: Address, data: Bytes) -> Result<Bytes> {
    let request = TransactionRequest {
        from: Some(client.owner),
        to: Some(to.into()),
        input: TransactionInput::new(data),
        ..Default::default()
    };
    client
        .provider
        .call(request)
        .await
        .map_err(WorkflowError::transport)
}

pub async fn get_balance(client: &RpcClient) -> Result<U256> {
    client
        .provider
        .get_balance(client.owner)
        .await
        .map_err(WorkflowError::transport)
}

/// Sign and broadcast; returns as soon as the node accepts the transaction.
pub async fn send_transaction(client: &RpcClient, request: TransactionRequest) -> Result<B256> {
    let pending = client
        .provider
        .send_transaction(request)
        .await
        .map_err(WorkflowError::transport)?;
    Ok(*pending.tx_hash())
}

pub async fn get_transaction_receipt(
    client: &RpcClient,
    tx_hash: B256,
) -> Result<Option<TransactionReceipt>> {
    client
        .provider
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(WorkflowError::transport)
}

/// Background task publishing the latest block number.
pub struct BlockPoller {
    task: Mutex<Option<JoinHandle<()>>>,
    latest: watch::Receiver<u64>,
}

impl BlockPoller {
    pub fn spawn(provider: DynProvider, interval: Duration) -> Self {
        let (sender, latest) = watch::channel(0u64);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match provider.get_block_number().await {
                    Ok(number) => {
                        sender.send_if_modified(|current| {
                            if number > *current {
                                *current = number;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(err) => tracing::debug!(error = %err, "block number poll failed"),
                }
            }
        });
        Self {
            task: Mutex::new(Some(task)),
            latest,
        }
    }

    /// Wait for the next block. Returns `false` once the poller is stopped.
    pub async fn next_block(&self) -> bool {
        let mut latest = self.latest.clone();
        latest.borrow_and_update();
        latest.changed().await.is_ok()
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().ok().and_then(|mut slot| slot.take()) {
            task.abort();
        }
    }
}

impl Drop for BlockPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
