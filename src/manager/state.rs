use crate::cookies::Record;
use crate::manager::events::EventBus;
use crate::manager::{ManagerId, Snapshot};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const STATE_RUNNING: u8 = 0;
const STATE_CLOSED: u8 = 1;

/// State shared between the manager handles and the owner worker.
///
/// Only the worker ever calls [`Shared::publish`]; handles only read.
pub(crate) struct Shared<R> {
    pub id: ManagerId,
    /// Lifecycle: running or closed
    state: AtomicU8,
    /// Currently published collection version
    records: ArcSwap<Vec<Arc<R>>>,
    /// Change notifications
    pub events: EventBus,
}

impl<R: Record> Shared<R> {
    pub fn new(id: ManagerId, event_capacity: usize) -> Self {
        Self {
            id,
            state: AtomicU8::new(STATE_RUNNING),
            records: ArcSwap::from_pointee(Vec::new()),
            events: EventBus::new(event_capacity),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    /// Moves the manager to closed. Returns `true` only for the call that
    /// performed the transition.
    pub fn begin_close(&self) -> bool {
        self.state.swap(STATE_CLOSED, Ordering::AcqRel) == STATE_RUNNING
    }

    pub fn current(&self) -> Arc<Vec<Arc<R>>> {
        self.records.load_full()
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        Snapshot::new(self.current())
    }

    pub fn publish(&self, records: Arc<Vec<Arc<R>>>) {
        self.records.store(records);
    }
}
