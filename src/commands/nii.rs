use crate::cli::{GlobalArgs, NiiClaimArgs};
use crate::commands::deposit::{deposit_steps, DepositAmount};
use crate::commands::{gas_policy, Session};
use crate::config::Config;
use crate::error::{Result as WorkflowResult, WorkflowError};
use crate::workflow::amount::{select_range, Range};
use crate::workflow::capability::{CurrencyResolver, Operation};
use crate::workflow::{Step, StepPolicy, WorkflowContext};
use anyhow::{anyhow, Result};

pub async fn run(args: NiiClaimArgs, global: &GlobalArgs, config: Config) -> Result<()> {
    let range = select_range(args.range.blocks.as_deref(), args.range.accruals.as_deref())?;
    let symbol = args
        .currency
        .clone()
        .or_else(|| config.nii_currency().map(str::to_string))
        .ok_or_else(|| anyhow!("no interest currency: pass --currency or set [nii] currency"))?;
    let policy = gas_policy(global, &config)?;
    let contracts = config.contracts()?;
    contracts.interest_pool()?;
    contracts.vault()?;

    let session = Session::open(global, &config, policy, contracts).await?;
    let mut sequencer = session.sequencer();
    let outcomes = sequencer
        .run_planned(plan(session.context(), session.currencies(), &symbol, range))
        .await?;
    session.emit(&outcomes)
}

/// Release interest for `range`, then deposit the whole wallet balance of
/// the interest currency.
///
/// The release is advisory: the deposit re-reads the balance, so it still
/// moves whatever the wallet holds when the release fails or had nothing to
/// release.
pub async fn plan<'a>(
    ctx: WorkflowContext<'a>,
    currencies: &dyn CurrencyResolver,
    symbol: &str,
    range: Range,
) -> WorkflowResult<Vec<Step<'a>>> {
    let currency = currencies.resolve(symbol).await?;
    if currency.is_native() {
        return Err(WorkflowError::UnsupportedCurrency {
            symbol: currency.symbol,
            reason: "interest is paid in a token".to_string(),
        });
    }
    tracing::info!(currency = %currency.symbol, %range, "interest claim planned");

    let mut steps = vec![ctx.submit(
        format!("release interest for {range}"),
        StepPolicy::Advisory,
        Operation::ReleaseInterest { range },
    )];
    steps.extend(deposit_steps(ctx, &currency, DepositAmount::WalletBalance));
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::amount::{parse_range, RangeKind};
    use crate::workflow::progress::NoopReporter;
    use crate::workflow::report::reduce;
    use crate::workflow::sequencer::{Sequencer, StepOutcomes};
    use crate::workflow::testing::{gas, usdc, Failure, FakeChain, FakeCurrencies};
    use crate::types::Network;
    use alloy_primitives::U256;
    use std::time::Duration;

    async fn claim(chain: &FakeChain, symbol: &str) -> WorkflowResult<StepOutcomes> {
        let range = parse_range(RangeKind::Accruals, "0-2")?;
        let ctx = WorkflowContext {
            submitter: chain,
            chain,
            options: gas(),
        };
        let mut sequencer = Sequencer::new(chain, &NoopReporter, Duration::from_secs(30));
        sequencer
            .run_planned(plan(ctx, &FakeCurrencies, symbol, range))
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn releases_then_deposits_released_interest() {
        let chain = FakeChain::default();
        chain.set_interest(U256::from(500u64));

        let outcomes = claim(&chain, "USDC").await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(chain.submitted_kinds(), vec!["release", "approve", "deposit"]);
        assert_eq!(
            chain.submitted()[2],
            Operation::Deposit {
                currency: usdc(),
                amount: U256::from(500u64),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_release_still_deposits_wallet_balance() {
        let chain = FakeChain::default();
        chain.fail("release", Failure::Submit);
        chain.set_balance(&usdc(), U256::from(120u64));
        chain.set_allowance(&usdc(), U256::MAX);

        let outcomes = claim(&chain, "USDC").await.unwrap();
        let report = reduce(&outcomes, Network::Sepolia);

        assert_eq!(report.len(), 2);
        assert!(report[0].is_none());
        assert!(report[1].is_some());
        assert_eq!(chain.submitted_kinds(), vec!["deposit"]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_released_and_empty_wallet_skips_deposit() {
        let chain = FakeChain::default();

        let outcomes = claim(&chain, "USDC").await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(chain.submitted_kinds(), vec!["release"]);
    }

    #[tokio::test(start_paused = true)]
    async fn native_currency_is_rejected_before_submitting() {
        let chain = FakeChain::default();

        let err = claim(&chain, "ETH").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::UnsupportedCurrency { ref symbol, .. } if symbol == "ETH"
        ));
        assert!(chain.submitted().is_empty());
        assert_eq!(chain.stops(), 1);
    }
}
