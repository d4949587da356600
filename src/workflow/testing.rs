//! In-memory capability fakes shared by the workflow tests.

use crate::error::{Result, WorkflowError};
use crate::types::Currency;
use crate::workflow::amount::Range;
use crate::workflow::capability::{
    ChainState, ConfirmationRecord, ConfirmationStatus, CurrencyResolver, Operation, Submitter,
    TransactionHandle,
};
use crate::workflow::gas::GasOptions;
use crate::workflow::progress::{ProgressReporter, StepLabel};
use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Submit,
    /// Accepted but never mined.
    NeverMined,
    Revert,
}

#[derive(Debug, Clone, Copy)]
struct Scripted {
    pending_polls: usize,
    status: ConfirmationStatus,
}

/// A single-wallet chain: submissions apply their effects immediately and
/// are mined on the next receipt lookup unless scripted otherwise.
#[derive(Default)]
pub struct FakeChain {
    allowances: Mutex<HashMap<String, U256>>,
    balances: Mutex<HashMap<String, U256>>,
    claimable: Mutex<U256>,
    staged: Mutex<U256>,
    interest: Mutex<U256>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    receipts: Mutex<HashMap<B256, Scripted>>,
    lookups: Mutex<HashMap<B256, usize>>,
    lookup_errors: Mutex<HashMap<B256, usize>>,
    submitted: Mutex<Vec<Operation>>,
    next_block: AtomicUsize,
    stops: AtomicUsize,
    stopped: AtomicBool,
}

pub fn operation_kind(operation: &Operation) -> &'static str {
    match operation {
        Operation::Approve { .. } => "approve",
        Operation::Deposit { .. } => "deposit",
        Operation::StageFees { .. } => "stage",
        Operation::WithdrawFees => "withdraw",
        Operation::ReleaseInterest { .. } => "release",
    }
}

impl FakeChain {
    pub fn set_allowance(&self, currency: &Currency, amount: U256) {
        self.allowances
            .lock()
            .unwrap()
            .insert(currency.symbol.clone(), amount);
    }

    pub fn set_balance(&self, currency: &Currency, amount: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert(currency.symbol.clone(), amount);
    }

    pub fn set_claimable(&self, amount: U256) {
        *self.claimable.lock().unwrap() = amount;
    }

    pub fn set_staged(&self, amount: U256) {
        *self.staged.lock().unwrap() = amount;
    }

    /// Interest that a release moves into the balance of `currency`.
    pub fn set_interest(&self, amount: U256) {
        *self.interest.lock().unwrap() = amount;
    }

    pub fn fail(&self, kind: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(kind, failure);
    }

    pub fn mine_after(&self, hash: B256, pending_polls: usize, block_number: u64, gas_used: u64) {
        self.receipts.lock().unwrap().insert(
            hash,
            Scripted {
                pending_polls,
                status: ConfirmationStatus::Mined(ConfirmationRecord {
                    transaction_hash: hash,
                    block_number,
                    gas_used,
                }),
            },
        );
    }

    pub fn revert(&self, hash: B256) {
        self.receipts.lock().unwrap().insert(
            hash,
            Scripted {
                pending_polls: 0,
                status: ConfirmationStatus::Reverted,
            },
        );
    }

    /// Make the next `count` receipt lookups of `hash` fail.
    pub fn fail_lookups(&self, hash: B256, count: usize) {
        self.lookup_errors.lock().unwrap().insert(hash, count);
    }

    pub fn lookups(&self, hash: B256) -> usize {
        self.lookups.lock().unwrap().get(&hash).copied().unwrap_or(0)
    }

    pub fn submitted(&self) -> Vec<Operation> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_kinds(&self) -> Vec<&'static str> {
        self.submitted().iter().map(operation_kind).collect()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn apply(&self, operation: &Operation) {
        match operation {
            Operation::Approve { currency, amount } => self.set_allowance(currency, *amount),
            Operation::Deposit { currency, amount } => {
                let mut balances = self.balances.lock().unwrap();
                let balance = balances.entry(currency.symbol.clone()).or_default();
                *balance = balance.saturating_sub(*amount);
                drop(balances);
                if !currency.is_native() {
                    let mut allowances = self.allowances.lock().unwrap();
                    let allowance = allowances.entry(currency.symbol.clone()).or_default();
                    *allowance = allowance.saturating_sub(*amount);
                }
            }
            Operation::StageFees { .. } => {
                let claimable = std::mem::take(&mut *self.claimable.lock().unwrap());
                *self.staged.lock().unwrap() += claimable;
            }
            Operation::WithdrawFees => {
                *self.staged.lock().unwrap() = U256::ZERO;
            }
            Operation::ReleaseInterest { .. } => {
                let interest = std::mem::take(&mut *self.interest.lock().unwrap());
                let mut balances = self.balances.lock().unwrap();
                *balances.entry(interest_symbol()).or_default() += interest;
            }
        }
    }
}

pub fn interest_symbol() -> String {
    "USDC".to_string()
}

pub fn usdc() -> Currency {
    Currency::token(
        interest_symbol(),
        alloy_primitives::address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
        6,
    )
}

pub fn gas() -> GasOptions {
    GasOptions {
        gas_limit: 300_000,
        gas_price: 1_000_000_000,
    }
}

#[async_trait]
impl Submitter for FakeChain {
    async fn submit(
        &self,
        operation: &Operation,
        _options: &GasOptions,
    ) -> Result<TransactionHandle> {
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get(operation_kind(operation))
            .copied();
        if failure == Some(Failure::Submit) {
            return Err(WorkflowError::Transport("connection reset".to_string()));
        }

        let index = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(operation.clone());
            submitted.len() as u64
        };
        let hash = B256::left_padding_from(&index.to_be_bytes());

        match failure {
            Some(Failure::NeverMined) => {}
            Some(Failure::Revert) => self.revert(hash),
            _ => {
                self.apply(operation);
                let block = 100 + self.next_block.fetch_add(1, Ordering::SeqCst) as u64;
                self.mine_after(hash, 0, block, 21_000 * index);
            }
        }
        Ok(TransactionHandle { hash })
    }
}

#[async_trait]
impl ChainState for FakeChain {
    async fn allowance(&self, currency: &Currency) -> Result<U256> {
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&currency.symbol)
            .copied()
            .unwrap_or_default())
    }

    async fn balance(&self, currency: &Currency) -> Result<U256> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&currency.symbol)
            .copied()
            .unwrap_or_default())
    }

    async fn claimable_fees(&self, _range: &Range) -> Result<U256> {
        Ok(*self.claimable.lock().unwrap())
    }

    async fn staged_fees(&self) -> Result<U256> {
        Ok(*self.staged.lock().unwrap())
    }

    async fn confirmation(&self, hash: B256) -> Result<ConfirmationStatus> {
        *self.lookups.lock().unwrap().entry(hash).or_default() += 1;
        if let Some(remaining) = self.lookup_errors.lock().unwrap().get_mut(&hash) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WorkflowError::Transport("502 bad gateway".to_string()));
            }
        }
        let mut receipts = self.receipts.lock().unwrap();
        let Some(scripted) = receipts.get_mut(&hash) else {
            return Ok(ConfirmationStatus::Pending);
        };
        if scripted.pending_polls > 0 {
            scripted.pending_polls -= 1;
            return Ok(ConfirmationStatus::Pending);
        }
        Ok(scripted.status)
    }

    async fn block_advanced(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        true
    }

    fn stop_polling(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Resolves `ETH` and `USDC` only.
pub struct FakeCurrencies;

#[async_trait]
impl CurrencyResolver for FakeCurrencies {
    async fn resolve(&self, symbol: &str) -> Result<Currency> {
        match symbol {
            "ETH" => Ok(Currency::native()),
            "USDC" => Ok(usdc()),
            other => Err(WorkflowError::UnknownCurrency {
                symbol: other.to_string(),
            }),
        }
    }
}

/// Records every notification as `"<event> <label>"`.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: &str, label: &StepLabel) {
        self.events.lock().unwrap().push(format!("{event} {label}"));
    }
}

impl ProgressReporter for RecordingReporter {
    fn start(&self, label: &StepLabel) {
        self.push("start", label);
    }

    fn succeed(&self, label: &StepLabel) {
        self.push("succeed", label);
    }

    fn fail(&self, label: &StepLabel, _error: &WorkflowError) {
        self.push("fail", label);
    }

    fn skip(&self, label: &StepLabel) {
        self.push("skip", label);
    }
}
