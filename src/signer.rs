use crate::config::Config;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};

pub struct SignerOptions<'a> {
    pub private_key: Option<&'a str>,
    pub private_key_env: Option<&'a str>,
}

/// Load the wallet every state-changing command signs with.
pub fn load_signer(options: SignerOptions<'_>, config: &Config) -> Result<PrivateKeySigner> {
    if options.private_key.is_some() && options.private_key_env.is_some() {
        anyhow::bail!("cannot set both --private-key and --private-key-env");
    }

    if let Some(key) = options.private_key {
        return load_wallet(key);
    }

    let env = options
        .private_key_env
        .map(|value| value.to_string())
        .unwrap_or_else(|| config.signer_env());
    let key = std::env::var(&env)
        .map_err(|_| anyhow!("no signer: set --private-key or the {env} environment variable"))?;
    load_wallet(&key)
}

fn load_wallet(key: &str) -> Result<PrivateKeySigner> {
    key.trim()
        .parse()
        .map_err(|err| anyhow!("invalid private key: {err}"))
}
