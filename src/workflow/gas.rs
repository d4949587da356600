use crate::error::{Result, WorkflowError};
use crate::workflow::amount::parse_decimal;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GAS_LIMIT: u64 = 300_000;
pub const DEFAULT_GAS_PRICE: &str = "1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Unit a gas price is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasUnit {
    Wei,
    #[default]
    Gwei,
    Ether,
}

impl GasUnit {
    fn decimals(&self) -> u8 {
        match self {
            GasUnit::Wei => 0,
            GasUnit::Gwei => 9,
            GasUnit::Ether => 18,
        }
    }
}

impl FromStr for GasUnit {
    type Err = WorkflowError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "wei" => Ok(GasUnit::Wei),
            "gwei" => Ok(GasUnit::Gwei),
            "ether" | "eth" => Ok(GasUnit::Ether),
            other => Err(WorkflowError::InvalidGasPolicy(format!(
                "unknown gas unit {other} (expected wei, gwei or ether)"
            ))),
        }
    }
}

impl fmt::Display for GasUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GasUnit::Wei => "wei",
            GasUnit::Gwei => "gwei",
            GasUnit::Ether => "ether",
        })
    }
}

/// Transaction options shared by every step of one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasOptions {
    pub gas_limit: u64,
    /// Legacy gas price in wei.
    pub gas_price: u128,
}

/// Resolved gas options plus the per-step confirmation timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub options: GasOptions,
    pub timeout: Duration,
}

/// Unvalidated gas settings as collected from flags and config.
#[derive(Debug, Clone)]
pub struct GasInput<'a> {
    pub gas_limit: u64,
    pub gas_price: &'a str,
    pub unit: GasUnit,
    pub timeout_secs: u64,
}

impl Default for GasInput<'_> {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            unit: GasUnit::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Validate gas settings and convert the price to wei.
pub fn resolve_gas_policy(input: &GasInput<'_>) -> Result<GasPolicy> {
    if input.gas_limit == 0 {
        return Err(WorkflowError::InvalidGasPolicy(
            "gas limit must be greater than zero".to_string(),
        ));
    }
    if input.timeout_secs == 0 {
        return Err(WorkflowError::InvalidTimeout(input.timeout_secs));
    }

    let price = parse_decimal(input.gas_price, input.unit.decimals()).map_err(|err| {
        WorkflowError::InvalidGasPolicy(format!("gas price {}: {err}", input.gas_price))
    })?;
    if price.is_zero() {
        return Err(WorkflowError::InvalidGasPolicy(
            "gas price must be greater than zero".to_string(),
        ));
    }
    if price > U256::from(u128::MAX) {
        return Err(WorkflowError::InvalidGasPolicy(format!(
            "gas price {} {} is out of range",
            input.gas_price, input.unit
        )));
    }

    Ok(GasPolicy {
        options: GasOptions {
            gas_limit: input.gas_limit,
            gas_price: price.to::<u128>(),
        },
        timeout: Duration::from_secs(input.timeout_secs),
    })
}
