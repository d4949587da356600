use crate::commands;
use crate::config::Config;
use crate::types::Network;
use crate::workflow::gas::GasUnit;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cast-vault",
    version,
    about = "Staged vault deposits, fee claims and interest claims"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub async fn run(self, config: Config) -> Result<()> {
        match self.command {
            Command::Deposit(args) => commands::deposit::run(args, &self.global, config).await,
            Command::Fees(cmd) => cmd.run(&self.global, config).await,
            Command::Nii(cmd) => cmd.run(&self.global, config).await,
        }
    }
}

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(flatten)]
    pub rpc: RpcArgs,

    #[command(flatten)]
    pub signer: SignerArgs,

    #[command(flatten)]
    pub gas: GasArgs,

    /// Explorer used for the links in the report.
    #[arg(long, global = true)]
    pub network: Option<Network>,

    /// Log progress instead of drawing spinners.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct RpcArgs {
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    #[arg(long, global = true)]
    pub chain: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct SignerArgs {
    #[arg(long, global = true)]
    pub private_key: Option<String>,

    #[arg(long, global = true)]
    pub private_key_env: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct GasArgs {
    #[arg(long, global = true)]
    pub gas_limit: Option<u64>,

    /// Gas price, in `--gas-unit`.
    #[arg(long, global = true)]
    pub gas_price: Option<String>,

    #[arg(long, global = true)]
    pub gas_unit: Option<GasUnit>,

    /// Seconds to wait for each transaction to be mined.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deposit AMOUNT of CURRENCY into the vault.
    Deposit(DepositArgs),
    Fees(FeesCommand),
    Nii(NiiCommand),
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Human-readable amount, e.g. `1.5`.
    pub amount: String,

    /// Configured symbol, `ETH`, or a token address.
    pub currency: String,
}

#[derive(Parser, Debug)]
pub struct FeesCommand {
    #[command(subcommand)]
    pub command: FeesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum FeesSubcommand {
    /// Stage and withdraw distributor fees for a range.
    Claim(RangeArgs),
}

impl FeesCommand {
    pub async fn run(self, global: &GlobalArgs, config: Config) -> Result<()> {
        match self.command {
            FeesSubcommand::Claim(args) => commands::fees::run(args, global, config).await,
        }
    }
}

#[derive(Parser, Debug)]
pub struct NiiCommand {
    #[command(subcommand)]
    pub command: NiiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum NiiSubcommand {
    /// Release accrued interest and deposit it into the vault.
    Claim(NiiClaimArgs),
}

impl NiiCommand {
    pub async fn run(self, global: &GlobalArgs, config: Config) -> Result<()> {
        match self.command {
            NiiSubcommand::Claim(args) => commands::nii::run(args, global, config).await,
        }
    }
}

/// Exactly one of the two ranges must be given.
#[derive(Args, Debug, Default)]
pub struct RangeArgs {
    /// Block range, `N` or `FIRST-LAST`.
    #[arg(long)]
    pub blocks: Option<String>,

    /// Accrual index range, `N` or `FIRST-LAST`.
    #[arg(long)]
    pub accruals: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct NiiClaimArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Interest currency; defaults to `[nii] currency` from the config.
    #[arg(long)]
    pub currency: Option<String>,
}
