//! Staged transaction workflow engine.
//!
//! A workflow is a list of [`Step`]s run by the [`Sequencer`]: each step is
//! optionally skipped based on current chain state, submitted, awaited, and
//! recorded. Commands only declare their steps.

pub mod amount;
pub mod capability;
pub mod confirm;
pub mod gas;
pub mod progress;
pub mod report;
pub mod sequencer;
pub mod skip;
#[cfg(test)]
pub mod testing;

pub use capability::{ChainState, Operation, Submitter};
pub use gas::GasOptions;
pub use sequencer::{Sequencer, Step, StepPolicy};

/// Capabilities and options shared by all steps of one invocation.
#[derive(Clone, Copy)]
pub struct WorkflowContext<'a> {
    pub submitter: &'a dyn Submitter,
    pub chain: &'a dyn ChainState,
    pub options: GasOptions,
}

impl<'a> WorkflowContext<'a> {
    /// A step that submits a fixed `operation`.
    pub fn submit(
        &self,
        name: impl Into<String>,
        policy: StepPolicy,
        operation: Operation,
    ) -> Step<'a> {
        let submitter = self.submitter;
        let options = self.options;
        Step::new(name, policy, move || async move {
            submitter.submit(&operation, &options).await
        })
    }
}
