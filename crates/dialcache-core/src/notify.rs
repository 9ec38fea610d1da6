//! Conflated change notifications from the external source.
//!
//! The source may emit change events in bursts. The bridge is a
//! capacity-1 channel: while a sync pass is in flight, any number of
//! notifications collapse into exactly one pending trigger, delivered
//! once the pass completes. Dropping the notifier closes the channel
//! so no trigger fires after teardown.

use tokio::sync::mpsc;

/// Create a linked notifier/listener pair for one sync domain.
#[must_use]
pub fn change_signal() -> (ChangeNotifier, ChangeListener) {
    let (tx, rx) = mpsc::channel(1);
    (ChangeNotifier { tx }, ChangeListener { rx })
}

/// Producer half, handed to whatever observes the external source.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: mpsc::Sender<()>,
}

impl ChangeNotifier {
    /// Signal that the source changed. If a trigger is already pending
    /// the call is a no-op - that is the conflation.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Consumer half, owned by the sync orchestrator's task loop.
pub struct ChangeListener {
    rx: mpsc::Receiver<()>,
}

impl ChangeListener {
    /// Wait for the next trigger. Returns `false` once all notifier
    /// handles are dropped and no trigger is pending.
    pub async fn changed(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_burst_conflates_to_one_trigger() {
        let (notifier, mut listener) = change_signal();

        notifier.notify();
        notifier.notify();
        notifier.notify();

        assert!(listener.changed().await);
        // Nothing else pending
        assert!(listener.rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_closed_after_notifier_dropped() {
        let (notifier, mut listener) = change_signal();
        notifier.notify();
        drop(notifier);

        // The pending trigger still delivers, then the channel closes
        assert!(listener.changed().await);
        assert!(!listener.changed().await);
    }
}
