use tokio::sync::broadcast;

/// A handle for receiving change notifications of one manager.
pub type Subscription = broadcast::Receiver<ManagerEvent>;

/// Change notifications, emitted by the owner worker in merge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// A batch has been merged. Names are listed in batch order.
    Stored {
        added: Vec<String>,
        updated: Vec<String>,
    },
    /// The worker has stopped; no more events follow.
    Closed,
}

#[derive(Debug)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<ManagerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    pub fn publish(&self, ev: ManagerEvent) {
        // send() only fails when nobody is subscribed, which is fine
        let _ = self.tx.send(ev);
    }
}
