//! One-shot latch around the cleanup sequence.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Ensures cleanup runs at most once across every trigger path.
///
/// The latch is never released: whoever wins [`try_acquire`] owns cleanup
/// for the rest of the process, and the losers can [`wait_complete`] so they
/// do not exit underneath it.
///
/// [`try_acquire`]: CleanupGuard::try_acquire
/// [`wait_complete`]: CleanupGuard::wait_complete
#[derive(Debug)]
pub struct CleanupGuard {
    claimed: AtomicBool,
    done: watch::Sender<bool>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            claimed: AtomicBool::new(false),
            done,
        }
    }

    /// Flip not-run → running. `true` for exactly one caller.
    pub fn try_acquire(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the winner once the cleanup sequence has finished.
    pub fn complete(&self) {
        self.done.send_replace(true);
    }

    /// Resolve once [`complete`](CleanupGuard::complete) has been called.
    pub async fn wait_complete(&self) {
        let mut rx = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for CleanupGuard {
    fn default() -> Self {
        Self::new()
    }
}
