//! Ordered execution of a [`CommandSequence`].

use std::sync::atomic::{AtomicBool, Ordering};

use curtain_core::CommandSequence;

use crate::error::SequenceError;
use crate::runner::CommandRunner;

/// How a sequence reacts to a failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMode {
    /// Stop at the first failing step unless that step sets `ignore_error`.
    AbortOnError,
    /// Log every failure and keep going.
    IgnoreErrors,
}

/// Per-run tally, mostly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub executed: usize,
    pub failed: usize,
    /// The stop flag was raised before every step had run.
    pub stopped: bool,
}

impl CommandRunner {
    /// Run `steps` strictly in order.
    ///
    /// Background steps count as executed once started; they are never
    /// awaited or ordered against later steps.
    pub async fn run_sequence(
        &self,
        steps: &CommandSequence,
        mode: SequenceMode,
    ) -> Result<SequenceReport, SequenceError> {
        self.run_sequence_until(steps, mode, &AtomicBool::new(false))
            .await
    }

    /// Like [`run_sequence`](Self::run_sequence), but checks `stop` before
    /// each step. A step already in flight always runs to completion.
    pub async fn run_sequence_until(
        &self,
        steps: &CommandSequence,
        mode: SequenceMode,
        stop: &AtomicBool,
    ) -> Result<SequenceReport, SequenceError> {
        let mut report = SequenceReport::default();

        for (index, step) in steps.iter().enumerate() {
            if stop.load(Ordering::Acquire) {
                tracing::info!(skipped = steps.len() - index, "sequence stopped before '{step}'");
                report.stopped = true;
                break;
            }
            report.executed += 1;
            let Err(source) = self.run(step).await else {
                continue;
            };

            report.failed += 1;
            tracing::error!("---> {source}");
            if mode == SequenceMode::AbortOnError && !step.ignore_error {
                return Err(SequenceError {
                    index,
                    command: step.command.clone(),
                    source,
                });
            }
        }

        Ok(report)
    }
}
