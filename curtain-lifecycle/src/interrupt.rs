//! OS interrupt listener.
//!
//! One background task waits for ctrl-c and fans every occurrence out to all
//! subscribed [`EventSource`]s.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::multiplexer::EventSource;

pub const INTERRUPT_LABEL: &str = "interrupt";

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<()>>>>;

pub struct InterruptListener {
    subscribers: Subscribers,
    handle: JoinHandle<()>,
}

impl InterruptListener {
    /// Listen for ctrl-c / SIGINT. Must be called inside a tokio runtime.
    pub fn install() -> Self {
        Self::from_signal(tokio::signal::ctrl_c)
    }

    /// Listen on an arbitrary signal future, re-armed after every delivery.
    pub fn from_signal<F, Fut>(mut next: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let subscribers: Subscribers = Arc::default();
        let handle = {
            let subscribers = subscribers.clone();
            tokio::spawn(async move {
                loop {
                    if let Err(err) = next().await {
                        // Subscribers stay open: a dead handler must not read
                        // as a trigger.
                        tracing::error!(error = %err, "interrupt handler failed");
                        std::future::pending::<()>().await;
                    }
                    tracing::info!("received interrupt");
                    let mut subs = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
                    subs.retain(|tx| tx.send(()).is_ok());
                }
            })
        };

        Self {
            subscribers,
            handle,
        }
    }

    /// A fresh source that sees every interrupt delivered from now on.
    pub fn subscribe(&self) -> EventSource {
        let (tx, source) = EventSource::channel(INTERRUPT_LABEL);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        source
    }
}

impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
