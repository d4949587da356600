use crate::error::Result;
use crate::types::Currency;
use crate::workflow::amount::Range;
use crate::workflow::capability::ChainState;
use alloy_primitives::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceStep {
    /// Reset a non-zero allowance to zero before approving.
    Clear,
    Approve,
}

/// Which allowance steps a transfer of `required` needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowancePlan {
    pub clear: bool,
    pub approve: bool,
}

impl AllowancePlan {
    pub fn evaluate(current: U256, required: U256) -> Self {
        if current >= required {
            Self {
                clear: false,
                approve: false,
            }
        } else if !current.is_zero() {
            Self {
                clear: true,
                approve: true,
            }
        } else {
            Self {
                clear: false,
                approve: true,
            }
        }
    }

    pub fn steps(&self) -> Vec<AllowanceStep> {
        let mut steps = Vec::new();
        if self.clear {
            steps.push(AllowanceStep::Clear);
        }
        if self.approve {
            steps.push(AllowanceStep::Approve);
        }
        steps
    }

    pub fn includes(&self, step: AllowanceStep) -> bool {
        match step {
            AllowanceStep::Clear => self.clear,
            AllowanceStep::Approve => self.approve,
        }
    }
}

/// Read the current allowance and decide whether `step` is a no-op.
pub async fn allowance_step_not_needed(
    chain: &dyn ChainState,
    currency: &Currency,
    required: U256,
    step: AllowanceStep,
) -> Result<bool> {
    let current = chain.allowance(currency).await?;
    let plan = AllowancePlan::evaluate(current, required);
    tracing::debug!(
        currency = %currency.symbol,
        %current,
        %required,
        ?step,
        needed = plan.includes(step),
        "allowance check"
    );
    Ok(!plan.includes(step))
}

/// Fee balances read before a fee claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePlan {
    pub claimable: U256,
    pub staged: U256,
}

impl FeePlan {
    /// Read claimable and staged fees concurrently.
    pub async fn read(chain: &dyn ChainState, range: &Range) -> Result<Self> {
        let (claimable, staged) =
            tokio::try_join!(chain.claimable_fees(range), chain.staged_fees())?;
        tracing::info!(%range, %claimable, %staged, "fee balances");
        Ok(Self { claimable, staged })
    }

    pub fn stage(&self) -> bool {
        !self.claimable.is_zero()
    }

    pub fn withdraw(&self) -> bool {
        !self.claimable.is_zero() || !self.staged.is_zero()
    }
}
