//! Change notifications for observers of the session.
//!
//! Notifications carry no payload. A subscriber that sees a change re-reads
//! [`crate::ExplorationProgressEngine::current_state_view`] instead of caching
//! anything from the signal itself.

use std::collections::HashMap;

use tokio::sync::watch;

/// Data an observer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTopic {
    /// The current-state view of the active session.
    CurrentState,
}

impl DataTopic {
    pub const ALL: [DataTopic; 1] = [DataTopic::CurrentState];
}

/// Fire-and-forget signal that a topic's data changed.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, topic: DataTopic);
}

/// Watch-channel backed [`ChangeNotifier`].
///
/// Each topic has one channel carrying a version counter, so a slow subscriber
/// sees the latest change rather than a backlog.
#[derive(Debug)]
pub struct SubscriptionManager {
    channels: HashMap<DataTopic, watch::Sender<u64>>,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    #[must_use]
    pub fn new() -> Self {
        let channels = DataTopic::ALL
            .into_iter()
            .map(|topic| (topic, watch::Sender::new(0)))
            .collect();
        Self { channels }
    }

    /// Receiver whose `changed()` resolves after the next notify on `topic`.
    #[must_use]
    pub fn subscribe(&self, topic: DataTopic) -> watch::Receiver<u64> {
        match self.channels.get(&topic) {
            Some(sender) => sender.subscribe(),
            None => watch::Sender::new(0).subscribe(),
        }
    }

    /// Number of notifications sent on `topic` so far.
    #[must_use]
    pub fn version(&self, topic: DataTopic) -> u64 {
        self.channels.get(&topic).map_or(0, |sender| *sender.borrow())
    }
}

impl ChangeNotifier for SubscriptionManager {
    fn notify(&self, topic: DataTopic) {
        if let Some(sender) = self.channels.get(&topic) {
            sender.send_modify(|version| *version += 1);
            tracing::trace!(?topic, version = *sender.borrow(), "Topic notified");
        }
    }
}
