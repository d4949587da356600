use crate::types::{parse_address, Network};
use crate::workflow::gas::GasUnit;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    pub network: Option<Network>,
    pub chains: Option<BTreeMap<String, ChainConfig>>,
    pub signer: Option<SignerConfig>,
    pub contracts: Option<ContractsConfig>,
    pub gas: Option<GasConfig>,
    pub currencies: Option<BTreeMap<String, CurrencyConfig>>,
    pub nii: Option<NiiConfig>,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub rpc: String,
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct SignerConfig {
    pub private_key_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ContractsConfig {
    pub vault: Option<String>,
    pub fee_distributor: Option<String>,
    pub interest_pool: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct GasConfig {
    pub limit: Option<u64>,
    pub price: Option<String>,
    pub unit: Option<GasUnit>,
    pub timeout_secs: Option<u64>,
    pub poll_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrencyConfig {
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct NiiConfig {
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedRpc {
    pub url: String,
    pub alias: Option<String>,
    pub chain_id: Option<u64>,
}

/// Contract addresses the workflows talk to. Each command checks the ones it
/// needs before anything is submitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    pub vault: Option<Address>,
    pub fee_distributor: Option<Address>,
    pub interest_pool: Option<Address>,
}

impl Contracts {
    pub fn vault(&self) -> Result<Address> {
        self.vault
            .ok_or_else(|| anyhow::anyhow!("contracts.vault is not configured"))
    }

    pub fn fee_distributor(&self) -> Result<Address> {
        self.fee_distributor
            .ok_or_else(|| anyhow::anyhow!("contracts.fee_distributor is not configured"))
    }

    pub fn interest_pool(&self) -> Result<Address> {
        self.interest_pool
            .ok_or_else(|| anyhow::anyhow!("contracts.interest_pool is not configured"))
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self {
                path,
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.path = path;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn signer_env(&self) -> String {
        self.signer
            .as_ref()
            .and_then(|cfg| cfg.private_key_env.clone())
            .unwrap_or_else(|| "PRIVATE_KEY".to_string())
    }

    pub fn network(&self) -> Network {
        self.network.unwrap_or_default()
    }

    pub fn gas(&self) -> GasConfig {
        self.gas.clone().unwrap_or_default()
    }

    pub fn nii_currency(&self) -> Option<&str> {
        self.nii.as_ref()?.currency.as_deref()
    }

    pub fn currency(&self, symbol: &str) -> Option<&CurrencyConfig> {
        self.currencies.as_ref()?.get(symbol)
    }

    pub fn contracts(&self) -> Result<Contracts> {
        let contracts = self.contracts.clone().unwrap_or_default();
        let parse = |value: Option<String>| value.as_deref().map(parse_address).transpose();
        Ok(Contracts {
            vault: parse(contracts.vault)?,
            fee_distributor: parse(contracts.fee_distributor)?,
            interest_pool: parse(contracts.interest_pool)?,
        })
    }

    pub fn resolve_rpc(&self, rpc: Option<&str>, chain: Option<&str>) -> Result<ResolvedRpc> {
        if rpc.is_some() && chain.is_some() {
            anyhow::bail!("cannot set both --rpc and --chain");
        }

        if let Some(rpc) = rpc {
            return Ok(ResolvedRpc {
                url: rpc.to_string(),
                alias: None,
                chain_id: None,
            });
        }

        if let Some(alias) = chain {
            let chain_cfg = self
                .chain(alias)
                .ok_or_else(|| anyhow::anyhow!("unknown chain alias: {alias}"))?;
            return Ok(ResolvedRpc {
                url: chain_cfg.rpc.clone(),
                alias: Some(alias.to_string()),
                chain_id: chain_cfg.chain_id,
            });
        }

        if let Some(chains) = self.chains.as_ref() {
            if let Some(chain_cfg) = chains.get("default") {
                return Ok(ResolvedRpc {
                    url: chain_cfg.rpc.clone(),
                    alias: Some("default".to_string()),
                    chain_id: chain_cfg.chain_id,
                });
            }
            if let (1, Some((alias, chain_cfg))) = (chains.len(), chains.iter().next()) {
                return Ok(ResolvedRpc {
                    url: chain_cfg.rpc.clone(),
                    alias: Some(alias.clone()),
                    chain_id: chain_cfg.chain_id,
                });
            }
        }
        anyhow::bail!("no rpc configured (set --rpc or --chain, or configure a default)")
    }

    pub fn chain(&self, alias: &str) -> Option<&ChainConfig> {
        self.chains.as_ref()?.get(alias)
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("cast-vault").join("config.toml");
    }
    PathBuf::from("./config.toml")
}
