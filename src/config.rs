/// Default capacity of the inbound command queue of a manager worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default capacity of the change notification bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

const DEFAULT_WORKER_NAME: &str = "cookie-manager";

/// Configuration for a single [`CookieManager`](crate::CookieManager).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// How many store/shutdown requests may wait in the worker queue before
    /// submitters are held back
    pub queue_capacity: usize,
    /// Name of the worker thread (shows up in debuggers and panics)
    pub worker_name: String,
    /// How many change events a lagging subscriber may fall behind
    pub event_capacity: usize,
}

impl ManagerConfig {
    /// Sets the capacity of the inbound queue. Zero is bumped to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    // tokio channels panic on a zero capacity
    pub(crate) fn queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub(crate) fn event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacities_are_clamped() {
        let cfg = ManagerConfig::default()
            .with_queue_capacity(0)
            .with_event_capacity(0);

        assert_eq!(cfg.queue_capacity(), 1);
        assert_eq!(cfg.event_capacity(), 1);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = ManagerConfig::default().with_worker_name("jar-1").with_queue_capacity(8);
        assert_eq!(cfg.worker_name, "jar-1");
        assert_eq!(cfg.queue_capacity(), 8);
        assert_eq!(cfg.event_capacity(), DEFAULT_EVENT_CAPACITY);
    }
}
