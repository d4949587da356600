use alloy_primitives::{Address, B256};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NATIVE_SYMBOL: &str = "ETH";
pub const NATIVE_DECIMALS: u8 = 18;

/// A currency the vault accepts, resolved to its on-chain identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub symbol: String,
    pub kind: CurrencyKind,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyKind {
    Native,
    Token(Address),
}

impl Currency {
    pub fn native() -> Self {
        Self {
            symbol: NATIVE_SYMBOL.to_string(),
            kind: CurrencyKind::Native,
            decimals: NATIVE_DECIMALS,
        }
    }

    pub fn token(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            kind: CurrencyKind::Token(address),
            decimals,
        }
    }

    pub fn token_address(&self) -> Option<Address> {
        match self.kind {
            CurrencyKind::Native => None,
            CurrencyKind::Token(address) => Some(address),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, CurrencyKind::Native)
    }
}

/// Network the explorer links in the report point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Sepolia,
    Holesky,
}

impl Network {
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://etherscan.io",
            Network::Sepolia => "https://sepolia.etherscan.io",
            Network::Holesky => "https://holesky.etherscan.io",
        }
    }

    pub fn tx_url(&self, hash: B256) -> String {
        format!("{}/tx/{hash:#x}", self.explorer_url())
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            other => anyhow::bail!("unknown network {other} (expected mainnet, sepolia or holesky)"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
        };
        f.write_str(name)
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|err| anyhow!("invalid address {value}: {err}"))
}

pub fn address_to_hex(address: Address) -> String {
    format!("{address:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn tx_url_uses_network_explorer() {
        let hash = b256!("00000000000000000000000000000000000000000000000000000000000000ab");
        assert_eq!(
            Network::Sepolia.tx_url(hash),
            "https://sepolia.etherscan.io/tx/0x00000000000000000000000000000000000000000000000000000000000000ab"
        );
        assert!(Network::Mainnet.tx_url(hash).starts_with("https://etherscan.io/tx/0x"));
    }

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!("Holesky".parse::<Network>().unwrap(), Network::Holesky);
        assert!("goerli".parse::<Network>().is_err());
    }
}
