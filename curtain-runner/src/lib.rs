//! # curtain-runner
//!
//! Step and sequence execution.
//!
//! [`CommandRunner::run`] executes one step: an external process (foreground
//! or detached) or a built-in macro handled by [`MacroEngine`].
//! [`CommandRunner::run_sequence`] runs a whole startup or cleanup list.

pub mod error;
pub mod macros;
pub mod runner;
pub mod sequence;

pub use error::{SequenceError, StepError};
pub use macros::MacroEngine;
pub use runner::{CommandRunner, StepOutcome};
pub use sequence::{SequenceMode, SequenceReport};
