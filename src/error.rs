use crate::workflow::capability::ConfirmationRecord;
use alloy_primitives::B256;
use thiserror::Error;

/// Errors raised by the staged transaction workflow.
///
/// The first group is input validation and is always raised before anything
/// touches the network. The rest are step-level failures.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("invalid range {input:?} (expected N or FIRST-LAST)")]
    InvalidRange { input: String },
    #[error("cannot set both --blocks and --accruals")]
    ConflictingRanges,
    #[error("set one of --blocks or --accruals")]
    MissingRange,
    #[error("invalid gas policy: {0}")]
    InvalidGasPolicy(String),
    #[error("invalid timeout {0}: must be a positive number of seconds")]
    InvalidTimeout(u64),
    #[error("unknown currency {symbol}")]
    UnknownCurrency { symbol: String },
    #[error("{symbol} cannot be used here: {reason}")]
    UnsupportedCurrency { symbol: String, reason: String },
    #[error("transaction {hash:#x} was not mined in time")]
    ConfirmationTimeout { hash: B256 },
    #[error("transaction {hash:#x} reverted")]
    Reverted { hash: B256 },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rpc error: {0}")]
    Transport(String),
    /// A required step failed. `committed` lists the steps that were already
    /// mined before it; those effects are permanent.
    #[error("step {step:?} failed after {} committed transaction(s)", .committed.len())]
    Aborted {
        step: String,
        committed: Vec<ConfirmationRecord>,
        #[source]
        source: Box<WorkflowError>,
    },
}

impl WorkflowError {
    pub fn invalid_amount(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// The underlying failure, looking through [`WorkflowError::Aborted`].
    pub fn root(&self) -> &WorkflowError {
        match self {
            WorkflowError::Aborted { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;
