//! Startup → armed wait → cleanup-once → exit.
//!
//! # State machine
//! ```text
//! Loading ──▶ Starting ──(startup ok)──▶ Armed ──(any trigger)──▶ Cleaning ──▶ Terminated
//!                 │                                                  ▲
//!                 └──(failing step, or interrupt between steps)──────┘
//! ```
//!
//! An interrupt during Starting never cancels the step in flight. The
//! interrupt watcher raises a stop flag, the startup sequence returns before
//! its next step, and the main path moves to Cleaning. Every path into
//! Cleaning goes through [`Lifecycle::terminate`], whose [`CleanupGuard`] lets
//! exactly one caller run the cleanup sequence.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use curtain_core::Config;
use curtain_runner::{CommandRunner, SequenceMode};

use crate::guard::CleanupGuard;
use crate::hotkey::HotkeyBinding;
use crate::interrupt::InterruptListener;
use crate::multiplexer::{EventMultiplexer, Readiness};

/// Lifecycle states, in the only order they may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Loading,
    Starting,
    Armed,
    Cleaning,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Loading => write!(f, "loading"),
            Phase::Starting => write!(f, "starting"),
            Phase::Armed => write!(f, "armed"),
            Phase::Cleaning => write!(f, "cleaning"),
            Phase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why the lifecycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Interrupt,
    /// `index` is the position in the configured hot-key list.
    Hotkey { index: usize, name: String },
    StartupFailure,
    /// Every event source closed; nothing could ever fire again.
    SourcesExhausted,
}

impl Trigger {
    pub fn exit_code(&self) -> i32 {
        match self {
            Trigger::StartupFailure => 1,
            Trigger::Interrupt | Trigger::Hotkey { .. } | Trigger::SourcesExhausted => 0,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Interrupt => write!(f, "interrupt"),
            Trigger::Hotkey { name, .. } => write!(f, "hotkey {name}"),
            Trigger::StartupFailure => write!(f, "startup failure"),
            Trigger::SourcesExhausted => write!(f, "all event sources closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub trigger: Trigger,
    /// Whether this caller ran the cleanup sequence itself.
    pub ran_cleanup: bool,
    pub code: i32,
}

pub struct Lifecycle {
    config: Arc<Config>,
    runner: CommandRunner,
    guard: CleanupGuard,
    phase: watch::Sender<Phase>,
    interrupted: AtomicBool,
}

impl Lifecycle {
    pub fn new(config: Config, runner: CommandRunner) -> Arc<Self> {
        let (phase, _) = watch::channel(Phase::Loading);
        Arc::new(Self {
            config: Arc::new(config),
            runner,
            guard: CleanupGuard::new(),
            phase,
            interrupted: AtomicBool::new(false),
        })
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Phases only move forward; a late `Armed` after cleanup is ignored.
    fn set_phase(&self, next: Phase) {
        self.phase.send_if_modified(|current| {
            if next <= *current {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "lifecycle phase");
            *current = next;
            true
        });
    }

    /// Drive the whole lifecycle from Starting to Terminated.
    ///
    /// Hot-keys are registered by the caller beforehand; `interrupt` must
    /// already be installed. Every trigger routes to cleanup followed by
    /// exit.
    pub async fn run(
        self: &Arc<Self>,
        hotkeys: Vec<HotkeyBinding>,
        interrupt: &InterruptListener,
    ) -> Termination {
        // Subscribed before startup so an interrupt during startup is never lost.
        let interrupt_source = interrupt.subscribe();
        let watcher = self.spawn_interrupt_watcher(interrupt);
        self.set_phase(Phase::Starting);

        tracing::info!("[RUN STARTUP COMMANDS]");
        let startup = self
            .runner
            .run_sequence_until(
                &self.config.startup,
                SequenceMode::AbortOnError,
                &self.interrupted,
            )
            .await;
        watcher.abort();

        match startup {
            Err(err) => {
                tracing::error!(error = %err, "startup aborted");
                return self.terminate(Trigger::StartupFailure).await;
            }
            Ok(report) if report.stopped || self.interrupted.load(Ordering::Acquire) => {
                return self.terminate(Trigger::Interrupt).await;
            }
            Ok(_) => {}
        }

        let mut sources = Vec::with_capacity(hotkeys.len() + 1);
        sources.push(interrupt_source);
        sources.extend(hotkeys.into_iter().map(|binding| binding.source));
        let mut mux = EventMultiplexer::new(sources);

        self.set_phase(Phase::Armed);
        tracing::info!(sources = mux.len(), "startup complete, waiting for a trigger");

        let trigger = loop {
            match mux.wait_any().await {
                Readiness::Fired(0) => break Trigger::Interrupt,
                Readiness::Fired(index) => {
                    let name = mux.label(index).unwrap_or_default().to_string();
                    break Trigger::Hotkey {
                        index: index - 1,
                        name,
                    };
                }
                Readiness::Closed(index) => {
                    tracing::warn!(
                        source = mux.label(index).unwrap_or_default(),
                        "event source closed"
                    );
                }
                Readiness::Exhausted => break Trigger::SourcesExhausted,
            }
        };

        self.terminate(trigger).await
    }

    /// Run cleanup if nobody has claimed it yet, otherwise wait for whoever
    /// did. Safe to call from any number of tasks at once.
    pub async fn terminate(&self, trigger: Trigger) -> Termination {
        let code = trigger.exit_code();

        if !self.guard.try_acquire() {
            tracing::debug!(%trigger, "cleanup already claimed");
            self.guard.wait_complete().await;
            return Termination {
                trigger,
                ran_cleanup: false,
                code,
            };
        }

        self.set_phase(Phase::Cleaning);
        tracing::info!(%trigger, "[RUN CLEANUP COMMANDS]");
        match self
            .runner
            .run_sequence(&self.config.cleanup, SequenceMode::IgnoreErrors)
            .await
        {
            Ok(report) => tracing::info!(
                executed = report.executed,
                failed = report.failed,
                "cleanup finished"
            ),
            Err(err) => tracing::error!(error = %err, "cleanup stopped early"),
        }
        self.guard.complete();
        self.set_phase(Phase::Terminated);

        Termination {
            trigger,
            ran_cleanup: true,
            code,
        }
    }

    /// Raises the stop flag on an interrupt during Starting. The step in
    /// flight keeps running; no later startup step is launched.
    fn spawn_interrupt_watcher(
        self: &Arc<Self>,
        interrupt: &InterruptListener,
    ) -> tokio::task::JoinHandle<()> {
        let mut source = interrupt.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if source.recv().await.is_some() {
                tracing::info!("interrupt during startup, stopping after the current step");
                this.interrupted.store(true, Ordering::Release);
            }
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use curtain_core::CommandStep;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    use super::*;
    use crate::multiplexer::EventSource;

    fn append(dir: &TempDir, tag: &str) -> CommandStep {
        let log = dir.path().join("log");
        CommandStep::new("sh", ["-c".to_string(), format!("echo {tag} >> '{}'", log.display())]).quiet()
    }

    fn read_log(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("log")).unwrap_or_default()
    }

    fn manual_interrupt() -> (Arc<Notify>, InterruptListener) {
        let notify = Arc::new(Notify::new());
        let listener = {
            let notify = notify.clone();
            InterruptListener::from_signal(move || {
                let notify = notify.clone();
                async move {
                    notify.notified().await;
                    Ok(())
                }
            })
        };
        (notify, listener)
    }

    fn hotkey(name: &str) -> (tokio::sync::mpsc::UnboundedSender<()>, HotkeyBinding) {
        let (tx, source) = EventSource::channel(name);
        (
            tx,
            HotkeyBinding {
                name: name.to_string(),
                id: 1,
                source,
            },
        )
    }

    async fn wait_for_phase(lifecycle: &Lifecycle, phase: Phase) {
        let mut rx = lifecycle.watch_phase();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|p| *p == phase))
            .await
            .expect("phase reached in time")
            .expect("phase channel open");
    }

    #[tokio::test]
    async fn startup_failure_skips_rest_and_runs_cleanup() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config {
            startup: vec![
                append(&dir, "A"),
                CommandStep::new("curtain-test-no-such-binary", Vec::<String>::new()),
                append(&dir, "C"),
            ],
            cleanup: vec![append(&dir, "cleanup")],
            hotkeys: vec![],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());
        let (_notify, interrupt) = manual_interrupt();

        let termination = lifecycle.run(Vec::new(), &interrupt).await;

        assert_eq!(termination.trigger, Trigger::StartupFailure);
        assert_eq!(termination.code, 1);
        assert!(termination.ran_cleanup);
        assert_eq!(read_log(&dir), "A\ncleanup\n");
        assert_eq!(lifecycle.phase(), Phase::Terminated);
    }

    #[tokio::test]
    async fn hotkey_runs_cleanup_and_exits_zero() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config {
            startup: vec![append(&dir, "up")],
            cleanup: vec![append(&dir, "down")],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());
        let (_notify, interrupt) = manual_interrupt();
        let (key_tx, binding) = hotkey("CTRL + SHIFT + ALT + K");

        let run = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.run(vec![binding], &interrupt).await })
        };
        wait_for_phase(&lifecycle, Phase::Armed).await;
        key_tx.send(()).expect("key down");

        let termination = run.await.expect("join");
        assert_eq!(
            termination.trigger,
            Trigger::Hotkey {
                index: 0,
                name: "CTRL + SHIFT + ALT + K".to_string()
            }
        );
        assert_eq!(termination.code, 0);
        assert_eq!(read_log(&dir), "up\ndown\n");
    }

    #[tokio::test]
    async fn failing_cleanup_step_does_not_stop_later_ones() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config {
            cleanup: vec![
                append(&dir, "one"),
                CommandStep::new("curtain-test-no-such-binary", Vec::<String>::new()),
                CommandStep::new("!WAIT_NOTHING", Vec::<String>::new()),
                append(&dir, "two"),
            ],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());

        let termination = lifecycle.terminate(Trigger::Interrupt).await;
        assert!(termination.ran_cleanup);
        assert_eq!(read_log(&dir), "one\ntwo\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_terminate_runs_cleanup_once_and_everyone_waits() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("log");
        let config = Config {
            cleanup: vec![CommandStep::new(
                "sh",
                ["-c".to_string(), format!("sleep 0.3; echo ran >> '{}'", log.display())],
            )
            .quiet()],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());
        let cleaners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let lifecycle = lifecycle.clone();
                let cleaners = cleaners.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let trigger = if i % 2 == 0 {
                        Trigger::Interrupt
                    } else {
                        Trigger::Hotkey { index: 0, name: "k".to_string() }
                    };
                    let termination = lifecycle.terminate(trigger).await;
                    if termination.ran_cleanup {
                        cleaners.fetch_add(1, Ordering::SeqCst);
                    }
                    // Nobody may return before cleanup has finished.
                    assert!(log.exists());
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join");
        }

        assert_eq!(cleaners.load(Ordering::SeqCst), 1);
        assert_eq!(read_log(&dir), "ran\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interrupt_and_hotkey_together_clean_up_once() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config {
            cleanup: vec![append(&dir, "cleanup")],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());
        let (notify, interrupt) = manual_interrupt();
        let (key_tx, binding) = hotkey("quit");

        let run = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.run(vec![binding], &interrupt).await })
        };
        wait_for_phase(&lifecycle, Phase::Armed).await;
        notify.notify_one();
        key_tx.send(()).expect("key down");

        let termination = run.await.expect("join");
        assert_eq!(termination.code, 0);
        assert_eq!(read_log(&dir), "cleanup\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn interrupt_during_startup_waits_for_the_step_in_flight() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("log");
        let config = Config {
            startup: vec![
                CommandStep::new(
                    "sh",
                    ["-c".to_string(), format!("sleep 0.5; echo first-startup >> '{}'", log.display())],
                )
                .quiet(),
                append(&dir, "late-startup"),
            ],
            cleanup: vec![
                append(&dir, "cleanup-begin"),
                CommandStep::new("sleep", ["0.3"]),
                append(&dir, "cleanup-end"),
            ],
            ..Config::default()
        };
        let lifecycle = Lifecycle::new(config, CommandRunner::default());
        let (notify, interrupt) = manual_interrupt();
        let (_key_tx, binding) = hotkey("quit");

        let run = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.run(vec![binding], &interrupt).await })
        };
        wait_for_phase(&lifecycle, Phase::Starting).await;
        notify.notify_one();

        let termination = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("terminated in time")
            .expect("join");

        assert_eq!(termination.trigger, Trigger::Interrupt);
        assert_eq!(termination.code, 0);
        assert!(termination.ran_cleanup);
        // The running step completes before cleanup; later startup steps never run.
        assert_eq!(read_log(&dir), "first-startup\ncleanup-begin\ncleanup-end\n");
    }
}
