//! Executes one [`CommandStep`].

use std::io::Write;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use curtain_core::CommandStep;

use crate::error::{exec_err, StepError};
use crate::macros::MacroEngine;

/// What a successful step left behind.
#[derive(Debug)]
pub enum StepOutcome {
    /// Foreground process ran to completion. `status` is reported, never judged.
    Completed { status: ExitStatus, output: String },
    /// Background process was started and left running.
    Detached { pid: Option<u32> },
    /// A macro precondition was met.
    MacroSatisfied,
}

#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    macros: MacroEngine,
}

impl CommandRunner {
    pub fn new(macros: MacroEngine) -> Self {
        Self { macros }
    }

    /// Run a step to completion (or, for background steps, to a successful start).
    ///
    /// Only launch and pipe failures are errors. A process that exits
    /// non-zero still counts as a success; the status is logged at warn level.
    pub async fn run(&self, step: &CommandStep) -> Result<StepOutcome, StepError> {
        if step.is_macro() {
            self.macros.run(step).await?;
            return Ok(StepOutcome::MacroSatisfied);
        }

        tracing::info!("running: {step}");
        let mut command = Command::new(&step.command);
        command.args(&step.args).stdin(Stdio::null());

        if step.background {
            // Output is never collected for detached steps, so nothing may
            // hold the read end of a pipe.
            if step.null_stdout {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            } else {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            let child = command.spawn().map_err(|e| exec_err(&step.command, e))?;
            let pid = child.id();
            tracing::debug!(command = %step.command, pid = ?pid, "started in background");
            return Ok(StepOutcome::Detached { pid });
        }

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| exec_err(&step.command, e))?;

        if !output.status.success() {
            tracing::warn!(command = %step.command, status = %output.status, "command exited unsuccessfully");
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !step.null_stdout {
            emit(&text);
        }

        Ok(StepOutcome::Completed {
            status: output.status,
            output: text,
        })
    }
}

fn emit(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{text}");
    let _ = stdout.flush();
}
