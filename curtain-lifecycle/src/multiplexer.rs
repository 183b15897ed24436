//! Wait on a runtime-sized set of event sources.
//!
//! Fan-in: every source gets a forwarding task that pushes `(index, event)`
//! onto one shared channel, so [`EventMultiplexer::wait_any`] is a single
//! receive no matter how many sources were armed.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A stream of "it happened" events, e.g. key-downs or interrupts.
#[derive(Debug)]
pub struct EventSource {
    label: String,
    rx: mpsc::UnboundedReceiver<()>,
}

impl EventSource {
    pub fn new(label: impl Into<String>, rx: mpsc::UnboundedReceiver<()>) -> Self {
        Self {
            label: label.into(),
            rx,
        }
    }

    /// A source plus the sender that feeds it.
    pub fn channel(label: impl Into<String>) -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(label, rx))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A pending event, without waiting.
    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }

    /// Next event, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

/// What [`EventMultiplexer::wait_any`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Source `index` delivered an event.
    Fired(usize),
    /// Source `index` closed without an event; the others stay armed.
    Closed(usize),
    /// No source is left that could ever fire.
    Exhausted,
}

#[derive(Debug)]
struct Wake {
    index: usize,
    fired: bool,
}

pub struct EventMultiplexer {
    labels: Vec<String>,
    rx: mpsc::UnboundedReceiver<Wake>,
    forwarders: Vec<JoinHandle<()>>,
}

impl EventMultiplexer {
    /// Arm every source. Must be called inside a tokio runtime.
    pub fn new(sources: Vec<EventSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let labels = sources.iter().map(|s| s.label.clone()).collect();
        let forwarders = sources
            .into_iter()
            .enumerate()
            .map(|(index, mut source)| {
                let tx = tx.clone();
                tokio::spawn(async move {
                    loop {
                        let fired = source.recv().await.is_some();
                        if tx.send(Wake { index, fired }).is_err() || !fired {
                            break;
                        }
                    }
                })
            })
            .collect();

        Self {
            labels,
            rx,
            forwarders,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Suspend until some source fires or closes.
    ///
    /// Simultaneous readiness yields one arbitrary winner; the rest stay
    /// queued for the next call.
    pub async fn wait_any(&mut self) -> Readiness {
        match self.rx.recv().await {
            Some(Wake { index, fired: true }) => Readiness::Fired(index),
            Some(Wake { index, fired: false }) => Readiness::Closed(index),
            None => Readiness::Exhausted,
        }
    }
}

impl Drop for EventMultiplexer {
    fn drop(&mut self) {
        for handle in &self.forwarders {
            handle.abort();
        }
    }
}
