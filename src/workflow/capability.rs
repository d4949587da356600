//! Capabilities the workflow engine consumes.
//!
//! The engine never signs, encodes or talks JSON-RPC itself; it drives these
//! traits. `crate::chain` implements them on top of alloy and the tests use
//! in-memory fakes.

use crate::error::Result;
use crate::types::Currency;
use crate::workflow::amount::Range;
use crate::workflow::gas::GasOptions;
use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use std::fmt;

/// Handle returned as soon as a transaction is accepted by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    pub hash: B256,
}

/// Proof that a transaction was mined successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationRecord {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Outcome of one receipt lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Mined(ConfirmationRecord),
    Reverted,
}

/// A state-changing call a step submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Set the vault's allowance over `currency` to `amount`.
    Approve { currency: Currency, amount: U256 },
    Deposit { currency: Currency, amount: U256 },
    /// Move claimable fees for `range` into the staged balance.
    StageFees { range: Range },
    WithdrawFees,
    /// Release accrued interest for `range` to the wallet.
    ReleaseInterest { range: Range },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Approve { currency, amount } => {
                write!(f, "approve {amount} {}", currency.symbol)
            }
            Operation::Deposit { currency, amount } => {
                write!(f, "deposit {amount} {}", currency.symbol)
            }
            Operation::StageFees { range } => write!(f, "stage fees for {range}"),
            Operation::WithdrawFees => f.write_str("withdraw staged fees"),
            Operation::ReleaseInterest { range } => write!(f, "release interest for {range}"),
        }
    }
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Sign and broadcast `operation`. Returns once the node accepted it.
    async fn submit(&self, operation: &Operation, options: &GasOptions)
        -> Result<TransactionHandle>;
}

/// Read access to the chain plus the background block poller.
#[async_trait]
pub trait ChainState: Send + Sync {
    /// Current vault allowance of the wallet over `currency`.
    async fn allowance(&self, currency: &Currency) -> Result<U256>;
    async fn balance(&self, currency: &Currency) -> Result<U256>;
    async fn claimable_fees(&self, range: &Range) -> Result<U256>;
    async fn staged_fees(&self) -> Result<U256>;
    /// Look up the receipt once.
    async fn confirmation(&self, hash: B256) -> Result<ConfirmationStatus>;
    /// Suspend until the poller observes a new block. Returns `false` once
    /// polling has stopped.
    async fn block_advanced(&self) -> bool;
    /// Stop background polling. Idempotent.
    fn stop_polling(&self);
}

#[async_trait]
pub trait CurrencyResolver: Send + Sync {
    async fn resolve(&self, symbol: &str) -> Result<Currency>;
}
