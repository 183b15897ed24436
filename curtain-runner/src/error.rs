//! Error types for curtain-runner.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single step.
///
/// A process that starts and exits non-zero is not an error here; only a
/// failure to launch it or to collect its pipes is.
#[derive(Debug, Error)]
pub enum StepError {
    /// The process could not be spawned or its pipes could not be read.
    #[error("failed to run '{command}': {source}")]
    Execution {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A macro precondition was still unmet at its deadline.
    #[error("{name} timeout after {timeout:?} ({attempts} attempts)")]
    Timeout {
        name: String,
        timeout: Duration,
        attempts: u32,
    },

    /// The step names a macro that does not exist.
    #[error("unknown macro {name}")]
    UnknownMacro { name: String },
}

/// A step failure that stopped a sequence.
#[derive(Debug, Error)]
#[error("step {index} ('{command}') failed: {source}")]
pub struct SequenceError {
    pub index: usize,
    pub command: String,
    #[source]
    pub source: StepError,
}

/// Convenience constructor for [`StepError::Execution`].
pub(crate) fn exec_err(command: impl Into<String>, source: std::io::Error) -> StepError {
    StepError::Execution {
        command: command.into(),
        source,
    }
}
