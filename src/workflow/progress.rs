use crate::error::WorkflowError;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// User-visible position of a step, e.g. `[2/3] approve USDC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLabel {
    pub index: usize,
    pub total: usize,
    pub name: String,
}

impl fmt::Display for StepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.index, self.total, self.name)
    }
}

/// Receives step boundary notifications. Never affects control flow.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, label: &StepLabel);
    fn succeed(&self, label: &StepLabel);
    fn fail(&self, label: &StepLabel, error: &WorkflowError);
    fn skip(&self, label: &StepLabel);
}

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _label: &StepLabel) {}
    fn succeed(&self, _label: &StepLabel) {}
    fn fail(&self, _label: &StepLabel, _error: &WorkflowError) {}
    fn skip(&self, _label: &StepLabel) {}
}

/// Reports through `tracing`; used when stderr is not a terminal or with `--json`.
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn start(&self, label: &StepLabel) {
        tracing::info!(step = %label, "step started");
    }

    fn succeed(&self, label: &StepLabel) {
        tracing::info!(step = %label, "step confirmed");
    }

    fn fail(&self, label: &StepLabel, error: &WorkflowError) {
        tracing::warn!(step = %label, error = %error, "step failed");
    }

    fn skip(&self, label: &StepLabel) {
        tracing::info!(step = %label, "step skipped");
    }
}

/// One terminal spinner per step.
#[derive(Default)]
pub struct SpinnerReporter {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerReporter {
    fn finish(&self, message: String) {
        if let Some(pb) = self.current.lock().ok().and_then(|mut slot| slot.take()) {
            pb.finish_with_message(message);
        }
    }
}

impl ProgressReporter for SpinnerReporter {
    fn start(&self, label: &StepLabel) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{label} ..."));
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.current.lock() {
            *slot = Some(pb);
        }
    }

    fn succeed(&self, label: &StepLabel) {
        self.finish(format!("{label} done"));
    }

    fn fail(&self, label: &StepLabel, error: &WorkflowError) {
        self.finish(format!("{label} failed: {error}"));
    }

    fn skip(&self, label: &StepLabel) {
        let pb = ProgressBar::new_spinner();
        pb.finish_with_message(format!("{label} skipped"));
    }
}
