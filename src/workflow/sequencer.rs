use crate::error::{Result, WorkflowError};
use crate::workflow::capability::{ChainState, ConfirmationRecord, TransactionHandle};
use crate::workflow::confirm::ConfirmationWaiter;
use crate::workflow::progress::{ProgressReporter, StepLabel};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::time::{Duration, Instant};

type SubmitFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<TransactionHandle>> + Send + 'a>;
type SkipFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<bool>> + Send + 'a>;

/// What a step's failure means for the rest of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure aborts the workflow.
    Required,
    /// Failure is recorded as an empty slot and the workflow continues.
    Advisory,
}

/// One submit-then-confirm unit of a workflow.
pub struct Step<'a> {
    name: String,
    policy: StepPolicy,
    submit: SubmitFn<'a>,
    skip_if: Option<SkipFn<'a>>,
}

impl<'a> Step<'a> {
    pub fn new<F, Fut>(name: impl Into<String>, policy: StepPolicy, submit: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<TransactionHandle>> + Send + 'a,
    {
        Self {
            name: name.into(),
            policy,
            submit: Box::new(move || submit().boxed()),
            skip_if: None,
        }
    }

    pub fn required<F, Fut>(name: impl Into<String>, submit: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<TransactionHandle>> + Send + 'a,
    {
        Self::new(name, StepPolicy::Required, submit)
    }

    /// Evaluate `predicate` right before the step would submit; `true` skips it.
    pub fn skip_if<F, Fut>(mut self, predicate: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<bool>> + Send + 'a,
    {
        self.skip_if = Some(Box::new(move || predicate().boxed()));
        self
    }

    /// Skip decided up front, e.g. from reads done while planning.
    pub fn skip_when(self, skip: bool) -> Self {
        self.skip_if(move || async move { Ok::<_, WorkflowError>(skip) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

/// One slot per attempted step; `None` for a failed advisory step.
pub type StepOutcomes = Vec<Option<ConfirmationRecord>>;

/// Stops chain polling when dropped, whichever way the workflow exits.
pub struct PollingGuard<'a> {
    chain: &'a dyn ChainState,
}

impl<'a> PollingGuard<'a> {
    pub fn new(chain: &'a dyn ChainState) -> Self {
        Self { chain }
    }
}

impl Drop for PollingGuard<'_> {
    fn drop(&mut self) {
        self.chain.stop_polling();
        tracing::debug!("chain polling stopped");
    }
}

/// Runs steps one at a time: skip check, submit, wait, record.
pub struct Sequencer<'a> {
    chain: &'a dyn ChainState,
    reporter: &'a dyn ProgressReporter,
    waiter: ConfirmationWaiter,
    timeout: Duration,
    state: WorkflowState,
}

impl<'a> Sequencer<'a> {
    pub fn new(
        chain: &'a dyn ChainState,
        reporter: &'a dyn ProgressReporter,
        timeout: Duration,
    ) -> Self {
        Self {
            chain,
            reporter,
            waiter: ConfirmationWaiter::default(),
            timeout,
            state: WorkflowState::NotStarted,
        }
    }

    pub fn with_waiter(mut self, waiter: ConfirmationWaiter) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub async fn run(&mut self, steps: Vec<Step<'_>>) -> Result<StepOutcomes> {
        self.run_planned(async move { Ok(steps) }).await
    }

    /// Build the step list with `plan` and run it.
    ///
    /// Polling is released when this returns, including when planning itself
    /// fails.
    pub async fn run_planned<'s, P>(&mut self, plan: P) -> Result<StepOutcomes>
    where
        P: Future<Output = Result<Vec<Step<'s>>>>,
    {
        let _guard = PollingGuard::new(self.chain);
        self.state = WorkflowState::Running;

        let result = match plan.await {
            Ok(steps) => self.execute(steps).await,
            Err(err) => Err(err),
        };

        self.state = if result.is_ok() {
            WorkflowState::Completed
        } else {
            WorkflowState::Aborted
        };
        result
    }

    async fn execute(&self, steps: Vec<Step<'_>>) -> Result<StepOutcomes> {
        let total = steps.len();
        let mut outcomes = StepOutcomes::with_capacity(total);

        for (position, step) in steps.into_iter().enumerate() {
            let Step {
                name,
                policy,
                submit,
                skip_if,
            } = step;
            let label = StepLabel {
                index: position + 1,
                total,
                name,
            };

            let skipped = match skip_if {
                Some(predicate) => predicate().await,
                None => Ok(false),
            };
            let outcome = match skipped {
                Ok(true) => {
                    tracing::info!(step = %label, "step not needed, skipping");
                    self.reporter.skip(&label);
                    continue;
                }
                Ok(false) => {
                    self.reporter.start(&label);
                    self.attempt(&label, submit).await
                }
                Err(err) => Err(err),
            };

            match (outcome, policy) {
                (Ok(record), _) => {
                    self.reporter.succeed(&label);
                    outcomes.push(Some(record));
                }
                (Err(err), StepPolicy::Advisory) => {
                    tracing::warn!(step = %label, error = %err, "advisory step failed, continuing");
                    self.reporter.fail(&label, &err);
                    outcomes.push(None);
                }
                (Err(err), StepPolicy::Required) => {
                    tracing::error!(step = %label, error = %err, "required step failed, aborting");
                    self.reporter.fail(&label, &err);
                    return Err(WorkflowError::Aborted {
                        step: label.name,
                        committed: outcomes.into_iter().flatten().collect(),
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(outcomes)
    }

    async fn attempt(&self, label: &StepLabel, submit: SubmitFn<'_>) -> Result<ConfirmationRecord> {
        let started = Instant::now();
        let handle = submit().await?;
        tracing::info!(step = %label, tx_hash = %handle.hash, "transaction submitted");

        let record = self.waiter.wait(self.chain, handle, self.timeout).await?;
        tracing::info!(
            step = %label,
            tx_hash = %record.transaction_hash,
            block = record.block_number,
            gas_used = record.gas_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transaction confirmed"
        );
        Ok(record)
    }
}
