use crate::chain::lookup_currency;
use crate::cli::{DepositArgs, GlobalArgs};
use crate::commands::{gas_policy, Session};
use crate::config::{Config, CurrencyConfig};
use crate::error::{Result as WorkflowResult, WorkflowError};
use crate::types::Currency;
use crate::workflow::amount::{check_amount, normalize_amount};
use crate::workflow::capability::{ChainState, CurrencyResolver, Operation};
use crate::workflow::skip::{allowance_step_not_needed, AllowanceStep};
use crate::workflow::{Step, StepPolicy, WorkflowContext};
use alloy_primitives::U256;
use anyhow::Result;
use std::collections::BTreeMap;

/// How much a deposit moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositAmount {
    Fixed(U256),
    /// Whatever the wallet holds when the step runs.
    WalletBalance,
}

impl DepositAmount {
    async fn resolve(&self, chain: &dyn ChainState, currency: &Currency) -> WorkflowResult<U256> {
        match self {
            DepositAmount::Fixed(amount) => Ok(*amount),
            DepositAmount::WalletBalance => chain.balance(currency).await,
        }
    }
}

pub async fn run(args: DepositArgs, global: &GlobalArgs, config: Config) -> Result<()> {
    let policy = gas_policy(global, &config)?;
    let contracts = config.contracts()?;
    contracts.vault()?;

    let configured = config.currencies.clone().unwrap_or_default();
    validate_amount(&args.amount, &args.currency, &configured)?;

    let session = Session::open(global, &config, policy, contracts).await?;
    let mut sequencer = session.sequencer();
    let outcomes = sequencer
        .run_planned(plan(
            session.context(),
            session.currencies(),
            &args.amount,
            &args.currency,
        ))
        .await?;
    session.emit(&outcomes)
}

/// Reject a malformed or zero amount before connecting. Precision is only
/// checked here when the currency's decimals are known offline.
fn validate_amount(
    amount: &str,
    symbol: &str,
    configured: &BTreeMap<String, CurrencyConfig>,
) -> WorkflowResult<()> {
    check_amount(amount)?;
    if let Some(currency) = lookup_currency(configured, symbol)? {
        normalize_amount(amount, currency.decimals)?;
    }
    Ok(())
}

/// Resolve the currency and amount, then lay out the deposit steps.
pub async fn plan<'a>(
    ctx: WorkflowContext<'a>,
    currencies: &dyn CurrencyResolver,
    amount: &str,
    symbol: &str,
) -> WorkflowResult<Vec<Step<'a>>> {
    let currency = currencies.resolve(symbol).await?;
    let amount = normalize_amount(amount, currency.decimals)?;
    tracing::info!(currency = %currency.symbol, %amount, "deposit planned");
    Ok(deposit_steps(ctx, &currency, DepositAmount::Fixed(amount)))
}

/// Clear and approve the vault's allowance when needed, then deposit.
///
/// Native deposits carry their value and have a single step.
pub fn deposit_steps<'a>(
    ctx: WorkflowContext<'a>,
    currency: &Currency,
    amount: DepositAmount,
) -> Vec<Step<'a>> {
    let mut steps = Vec::with_capacity(3);
    if !currency.is_native() {
        steps.push(allowance_step(ctx, currency.clone(), amount, AllowanceStep::Clear));
        steps.push(allowance_step(ctx, currency.clone(), amount, AllowanceStep::Approve));
    }
    steps.push(deposit_step(ctx, currency.clone(), amount));
    steps
}

fn allowance_step<'a>(
    ctx: WorkflowContext<'a>,
    currency: Currency,
    amount: DepositAmount,
    step: AllowanceStep,
) -> Step<'a> {
    let name = match step {
        AllowanceStep::Clear => format!("clear {} allowance", currency.symbol),
        AllowanceStep::Approve => format!("approve {}", currency.symbol),
    };
    let checked = currency.clone();

    Step::required(name, move || async move {
        let value = match step {
            AllowanceStep::Clear => U256::ZERO,
            AllowanceStep::Approve => amount.resolve(ctx.chain, &currency).await?,
        };
        let operation = Operation::Approve {
            currency,
            amount: value,
        };
        ctx.submitter.submit(&operation, &ctx.options).await
    })
    .skip_if(move || async move {
        let required = amount.resolve(ctx.chain, &checked).await?;
        if required.is_zero() {
            return Ok(true);
        }
        allowance_step_not_needed(ctx.chain, &checked, required, step).await
    })
}

fn deposit_step<'a>(ctx: WorkflowContext<'a>, currency: Currency, amount: DepositAmount) -> Step<'a> {
    let name = format!("deposit {}", currency.symbol);
    match amount {
        DepositAmount::Fixed(value) => ctx.submit(
            name,
            StepPolicy::Required,
            Operation::Deposit {
                currency,
                amount: value,
            },
        ),
        DepositAmount::WalletBalance => {
            let checked = currency.clone();
            Step::required(name, move || async move {
                let value = ctx.chain.balance(&currency).await?;
                let operation = Operation::Deposit {
                    currency,
                    amount: value,
                };
                ctx.submitter.submit(&operation, &ctx.options).await
            })
            .skip_if(move || async move {
                let balance = ctx.chain.balance(&checked).await?;
                Ok::<_, WorkflowError>(balance.is_zero())
            })
        }
    }
}
