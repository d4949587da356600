use crate::cli::{GlobalArgs, RangeArgs};
use crate::commands::{gas_policy, Session};
use crate::config::Config;
use crate::error::Result as WorkflowResult;
use crate::workflow::amount::{select_range, Range};
use crate::workflow::capability::Operation;
use crate::workflow::skip::FeePlan;
use crate::workflow::{Step, StepPolicy, WorkflowContext};
use anyhow::Result;

pub async fn run(args: RangeArgs, global: &GlobalArgs, config: Config) -> Result<()> {
    let range = select_range(args.blocks.as_deref(), args.accruals.as_deref())?;
    let policy = gas_policy(global, &config)?;
    let contracts = config.contracts()?;
    contracts.fee_distributor()?;

    let session = Session::open(global, &config, policy, contracts).await?;
    let mut sequencer = session.sequencer();
    let outcomes = sequencer
        .run_planned(plan(session.context(), range))
        .await?;
    session.emit(&outcomes)
}

/// Stage what is claimable for `range`, then withdraw everything staged.
pub async fn plan(ctx: WorkflowContext<'_>, range: Range) -> WorkflowResult<Vec<Step<'_>>> {
    let fees = FeePlan::read(ctx.chain, &range).await?;
    Ok(vec![
        ctx.submit(
            format!("stage fees for {range}"),
            StepPolicy::Required,
            Operation::StageFees { range },
        )
        .skip_when(!fees.stage()),
        ctx.submit(
            "withdraw staged fees",
            StepPolicy::Required,
            Operation::WithdrawFees,
        )
        .skip_when(!fees.withdraw()),
    ])
}
