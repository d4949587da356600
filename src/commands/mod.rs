pub mod deposit;
pub mod fees;
pub mod nii;

use crate::chain::{AlloyChain, ConfiguredCurrencies};
use crate::cli::GlobalArgs;
use crate::config::{Config, Contracts};
use crate::rpc::RpcClient;
use crate::signer::{load_signer, SignerOptions};
use crate::types::{address_to_hex, Network};
use crate::workflow::confirm::{ConfirmationWaiter, DEFAULT_POLL_INTERVAL};
use crate::workflow::gas::{
    resolve_gas_policy, GasInput, GasPolicy, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::workflow::progress::{LogReporter, ProgressReporter, SpinnerReporter};
use crate::workflow::report::{reduce, render};
use crate::workflow::sequencer::StepOutcomes;
use crate::workflow::{Sequencer, WorkflowContext};
use alloy_provider::Provider;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::time::Duration;

/// Gas settings from flags, then the `[gas]` table, then defaults.
pub fn gas_policy(global: &GlobalArgs, config: &Config) -> Result<GasPolicy> {
    let gas = config.gas();
    let price = global
        .gas
        .gas_price
        .as_deref()
        .or(gas.price.as_deref())
        .unwrap_or(DEFAULT_GAS_PRICE);
    let policy = resolve_gas_policy(&GasInput {
        gas_limit: global.gas.gas_limit.or(gas.limit).unwrap_or(DEFAULT_GAS_LIMIT),
        gas_price: price,
        unit: global.gas.gas_unit.or(gas.unit).unwrap_or_default(),
        timeout_secs: global
            .gas
            .timeout
            .or(gas.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    })?;
    tracing::debug!(
        gas_limit = policy.options.gas_limit,
        gas_price_wei = policy.options.gas_price,
        timeout_secs = policy.timeout.as_secs(),
        "gas policy resolved"
    );
    Ok(policy)
}

pub fn network(global: &GlobalArgs, config: &Config) -> Network {
    global.network.unwrap_or_else(|| config.network())
}

/// Everything one workflow invocation needs once inputs are validated.
pub struct Session {
    chain: AlloyChain,
    currencies: ConfiguredCurrencies,
    policy: GasPolicy,
    network: Network,
    poll_interval: Duration,
    reporter: Box<dyn ProgressReporter>,
}

impl Session {
    pub async fn open(
        global: &GlobalArgs,
        config: &Config,
        policy: GasPolicy,
        contracts: Contracts,
    ) -> Result<Self> {
        let resolved =
            config.resolve_rpc(global.rpc.rpc.as_deref(), global.rpc.chain.as_deref())?;
        let wallet = load_signer(
            SignerOptions {
                private_key: global.signer.private_key.as_deref(),
                private_key_env: global.signer.private_key_env.as_deref(),
            },
            config,
        )?;
        let client = RpcClient::connect(&resolved.url, wallet)?;

        if let Some(expected) = resolved.chain_id {
            let actual = client
                .provider
                .get_chain_id()
                .await
                .with_context(|| format!("failed to read chain id from {}", resolved.url))?;
            if actual != expected {
                anyhow::bail!("rpc {} serves chain {actual}, expected {expected}", resolved.url);
            }
        }
        tracing::info!(
            rpc = %resolved.url,
            chain = resolved.alias.as_deref().unwrap_or("-"),
            owner = %address_to_hex(client.owner),
            "session opened"
        );

        let poll_interval = config
            .gas()
            .poll_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let reporter: Box<dyn ProgressReporter> =
            if global.json || !std::io::stderr().is_terminal() {
                Box::new(LogReporter)
            } else {
                Box::new(SpinnerReporter::default())
            };
        let currencies =
            ConfiguredCurrencies::new(config.currencies.clone().unwrap_or_default(), client.clone());

        Ok(Self {
            chain: AlloyChain::new(client, contracts, poll_interval),
            currencies,
            policy,
            network: network(global, config),
            poll_interval,
            reporter,
        })
    }

    pub fn context(&self) -> WorkflowContext<'_> {
        WorkflowContext {
            submitter: &self.chain,
            chain: &self.chain,
            options: self.policy.options,
        }
    }

    pub fn currencies(&self) -> &ConfiguredCurrencies {
        &self.currencies
    }

    pub fn sequencer(&self) -> Sequencer<'_> {
        Sequencer::new(&self.chain, self.reporter.as_ref(), self.policy.timeout)
            .with_waiter(ConfirmationWaiter::new(self.poll_interval))
    }

    /// Print the report for a finished workflow to stdout.
    pub fn emit(&self, outcomes: &StepOutcomes) -> Result<()> {
        let report = reduce(outcomes, self.network);
        println!("{}", render(&report)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GasArgs;
    use crate::error::WorkflowError;
    use crate::workflow::gas::GasUnit;

    #[test]
    fn flags_override_config_gas() {
        let config = Config::parse("[gas]\nlimit = 250000\nprice = \"3\"\ntimeout_secs = 60\n").unwrap();
        let global = GlobalArgs {
            gas: GasArgs {
                gas_price: Some("5".to_string()),
                gas_unit: Some(GasUnit::Wei),
                ..GasArgs::default()
            },
            ..GlobalArgs::default()
        };

        let policy = gas_policy(&global, &config).unwrap();
        assert_eq!(policy.options.gas_limit, 250_000);
        assert_eq!(policy.options.gas_price, 5);
        assert_eq!(policy.timeout, Duration::from_secs(60));
    }

    #[test]
    fn defaults_apply_without_flags_or_config() {
        let policy = gas_policy(&GlobalArgs::default(), &Config::default()).unwrap();
        assert_eq!(policy.options.gas_limit, 300_000);
        assert_eq!(policy.options.gas_price, 1_000_000_000);
        assert_eq!(policy.timeout, Duration::from_secs(120));
    }

    #[test]
    fn zero_timeout_is_rejected_before_connecting() {
        let global = GlobalArgs {
            gas: GasArgs {
                timeout: Some(0),
                ..GasArgs::default()
            },
            ..GlobalArgs::default()
        };
        let err = gas_policy(&global, &Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn network_flag_beats_config() {
        let config = Config::parse("network = \"holesky\"\n").unwrap();
        assert_eq!(network(&GlobalArgs::default(), &config), Network::Holesky);

        let global = GlobalArgs {
            network: Some(Network::Sepolia),
            ..GlobalArgs::default()
        };
        assert_eq!(network(&global, &config), Network::Sepolia);
    }
}
