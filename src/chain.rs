//! Alloy-backed implementations of the workflow capabilities.

use crate::abi::{
    decode_decimals, decode_u256, encode_allowance_call, encode_balance_of_call,
    encode_claimable_fees_call, encode_decimals_call, encode_operation,
    encode_staged_fees_call, require_contract,
};
use crate::config::{Contracts, CurrencyConfig};
use crate::error::{Result, WorkflowError};
use crate::rpc::{
    eth_call, get_balance, get_transaction_receipt, send_transaction, BlockPoller, RpcClient,
};
use crate::types::{address_to_hex, parse_address, Currency, NATIVE_SYMBOL};
use crate::workflow::amount::Range;
use crate::workflow::capability::{
    ChainState, ConfirmationRecord, ConfirmationStatus, CurrencyResolver, Operation, Submitter,
    TransactionHandle,
};
use crate::workflow::gas::GasOptions;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// The wallet's view of the vault contracts, plus the block poller the
/// confirmation waiter parks on.
pub struct AlloyChain {
    client: RpcClient,
    contracts: Contracts,
    poller: BlockPoller,
}

impl AlloyChain {
    pub fn new(client: RpcClient, contracts: Contracts, poll_interval: Duration) -> Self {
        let poller = BlockPoller::spawn(client.provider.clone(), poll_interval);
        Self {
            client,
            contracts,
            poller,
        }
    }

    async fn read_u256(&self, to: Address, data: Bytes) -> Result<U256> {
        let result = eth_call(&self.client, to, data).await?;
        decode_u256(&result)
    }
}

#[async_trait]
impl Submitter for AlloyChain {
    async fn submit(
        &self,
        operation: &Operation,
        options: &GasOptions,
    ) -> Result<TransactionHandle> {
        let call = encode_operation(operation, &self.contracts)?;
        let request = TransactionRequest {
            from: Some(self.client.owner),
            to: Some(call.to.into()),
            input: TransactionInput::new(call.data),
            value: call.value,
            gas: Some(options.gas_limit),
            gas_price: Some(options.gas_price),
            ..Default::default()
        };
        let hash = send_transaction(&self.client, request).await?;
        tracing::debug!(%operation, tx_hash = %hash, to = %call.to, "transaction sent");
        Ok(TransactionHandle { hash })
    }
}

#[async_trait]
impl ChainState for AlloyChain {
    async fn allowance(&self, currency: &Currency) -> Result<U256> {
        let Some(token) = currency.token_address() else {
            // Native deposits carry their value and never need approval.
            return Ok(U256::MAX);
        };
        let vault = require_contract(self.contracts.vault, "vault")?;
        self.read_u256(token, encode_allowance_call(self.client.owner, vault))
            .await
    }

    async fn balance(&self, currency: &Currency) -> Result<U256> {
        match currency.token_address() {
            None => get_balance(&self.client).await,
            Some(token) => {
                self.read_u256(token, encode_balance_of_call(self.client.owner))
                    .await
            }
        }
    }

    async fn claimable_fees(&self, range: &Range) -> Result<U256> {
        let distributor = require_contract(self.contracts.fee_distributor, "fee_distributor")?;
        self.read_u256(
            distributor,
            encode_claimable_fees_call(self.client.owner, range),
        )
        .await
    }

    async fn staged_fees(&self) -> Result<U256> {
        let distributor = require_contract(self.contracts.fee_distributor, "fee_distributor")?;
        self.read_u256(distributor, encode_staged_fees_call(self.client.owner))
            .await
    }

    async fn confirmation(&self, hash: B256) -> Result<ConfirmationStatus> {
        let Some(receipt) = get_transaction_receipt(&self.client, hash).await? else {
            return Ok(ConfirmationStatus::Pending);
        };
        let Some(block_number) = receipt.block_number else {
            return Ok(ConfirmationStatus::Pending);
        };
        if !receipt.status() {
            return Ok(ConfirmationStatus::Reverted);
        }
        Ok(ConfirmationStatus::Mined(ConfirmationRecord {
            transaction_hash: receipt.transaction_hash,
            block_number,
            gas_used: receipt.gas_used,
        }))
    }

    async fn block_advanced(&self) -> bool {
        self.poller.next_block().await
    }

    fn stop_polling(&self) {
        self.poller.stop();
    }
}

/// Look `symbol` up without touching the network: configured tokens first,
/// then the native currency. `None` when neither matches.
pub fn lookup_currency(
    configured: &BTreeMap<String, CurrencyConfig>,
    symbol: &str,
) -> Result<Option<Currency>> {
    let entry = configured
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(symbol));
    if let Some((name, entry)) = entry {
        let address = parse_address(&entry.address).map_err(|err| {
            WorkflowError::NotFound(format!("currencies.{name}.address: {err}"))
        })?;
        return Ok(Some(Currency::token(name.clone(), address, entry.decimals)));
    }
    if symbol.eq_ignore_ascii_case(NATIVE_SYMBOL) {
        return Ok(Some(Currency::native()));
    }
    Ok(None)
}

/// Resolves currencies from the `[currencies]` table, the native symbol, or
/// a raw token address whose decimals are read on-chain.
pub struct ConfiguredCurrencies {
    configured: BTreeMap<String, CurrencyConfig>,
    client: RpcClient,
}

impl ConfiguredCurrencies {
    pub fn new(configured: BTreeMap<String, CurrencyConfig>, client: RpcClient) -> Self {
        Self { configured, client }
    }
}

#[async_trait]
impl CurrencyResolver for ConfiguredCurrencies {
    async fn resolve(&self, symbol: &str) -> Result<Currency> {
        if let Some(currency) = lookup_currency(&self.configured, symbol)? {
            return Ok(currency);
        }

        let unknown = || WorkflowError::UnknownCurrency {
            symbol: symbol.to_string(),
        };
        let token = parse_address(symbol).map_err(|_| unknown())?;
        let decimals = match eth_call(&self.client, token, encode_decimals_call()).await {
            Ok(data) => decode_decimals(&data)?,
            Err(err) => {
                tracing::debug!(token = %address_to_hex(token), error = %err, "decimals lookup failed");
                return Err(unknown());
            }
        };
        tracing::info!(token = %address_to_hex(token), decimals, "resolved token by address");
        Ok(Currency::token(address_to_hex(token), token, decimals))
    }
}
