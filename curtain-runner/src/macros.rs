//! Built-in blocking preconditions usable as sequence steps.
//!
//! Both macros poll on the calling task: check, and if unmet either give up
//! (deadline reached) or sleep one interval and check again. A `timeout` of
//! N waits N time units (seconds by default) from the first check.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use curtain_core::CommandStep;

use crate::error::StepError;

pub const WAIT_FILE: &str = "!WAIT_FILE";
pub const WAIT_PORT: &str = "!WAIT_PORT";

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct MacroEngine {
    poll_interval: Duration,
    connect_timeout: Duration,
    unit: Duration,
}

impl Default for MacroEngine {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            connect_timeout: CONNECT_TIMEOUT,
            unit: Duration::from_secs(1),
        }
    }
}

impl MacroEngine {
    pub fn new(poll_interval: Duration, connect_timeout: Duration, unit: Duration) -> Self {
        Self {
            poll_interval,
            connect_timeout,
            unit,
        }
    }

    /// Dispatch a macro step by case-insensitive name.
    pub async fn run(&self, step: &CommandStep) -> Result<(), StepError> {
        tracing::info!("run macro: {step}");
        match step.command.to_ascii_uppercase().as_str() {
            WAIT_FILE => self.wait_for_file(&step.args, step.timeout).await,
            WAIT_PORT => self.wait_for_port(&step.args, step.timeout).await,
            _ => Err(StepError::UnknownMacro {
                name: step.command.clone(),
            }),
        }
    }

    /// Succeed once every path exists.
    pub async fn wait_for_file(&self, paths: &[String], timeout: u64) -> Result<(), StepError> {
        self.poll_until(WAIT_FILE, timeout, move || async move {
            paths.iter().all(|p| Path::new(p).exists())
        })
        .await
    }

    /// Succeed once every `host:port` accepts a TCP connection in the same cycle.
    pub async fn wait_for_port(&self, endpoints: &[String], timeout: u64) -> Result<(), StepError> {
        self.poll_until(WAIT_PORT, timeout, move || async move {
            for endpoint in endpoints {
                if !self.probe(endpoint).await {
                    return false;
                }
            }
            true
        })
        .await
    }

    /// One connect attempt; the stream is dropped straight away.
    async fn probe(&self, endpoint: &str) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(endpoint)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                tracing::debug!(endpoint, error = %err, "port not ready");
                false
            }
            Err(_) => {
                tracing::debug!(endpoint, "connect attempt timed out");
                false
            }
        }
    }

    async fn poll_until<F, Fut>(&self, name: &str, timeout: u64, mut check: F) -> Result<(), StepError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let timeout = self
            .unit
            .saturating_mul(u32::try_from(timeout).unwrap_or(u32::MAX));
        let deadline = Instant::now() + timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if check().await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StepError::Timeout {
                    name: name.to_string(),
                    timeout,
                    attempts,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
