//! Shutdown signalling for background tasks.

use tokio::sync::broadcast;

/// Broadcast handle that stops event subscribers and storage watches.
///
/// Each task takes its own receiver via [`Shutdown::subscribe`] before it is
/// spawned; a single [`Shutdown::trigger`] reaches all of them.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners = listeners, "Shutdown triggered");
    }

    /// Number of tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
