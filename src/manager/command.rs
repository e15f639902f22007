//! Request/response protocol between manager handles and the owner worker.
//!
//! Every request carries its own one-shot reply channel, so concurrent
//! submitters never wake each other up.

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Result of a store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The whole batch has been merged and is visible to readers.
    Applied,
    /// The manager was closed; nothing of the batch has been applied.
    Closed,
    /// The caller gave up waiting before the worker picked the batch up;
    /// nothing of the batch has been applied.
    Cancelled,
}

impl StoreOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StoreOutcome::Applied)
    }
}

impl Display for StoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreOutcome::Applied => write!(f, "Applied"),
            StoreOutcome::Closed => write!(f, "Closed"),
            StoreOutcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This call closed the manager and the worker has stopped.
    Closed,
    /// Somebody else closed the manager already.
    AlreadyClosed,
    /// The manager is closed, but the caller stopped waiting for the worker
    /// to acknowledge.
    Cancelled,
}

impl Display for CloseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseOutcome::Closed => write!(f, "Closed"),
            CloseOutcome::AlreadyClosed => write!(f, "AlreadyClosed"),
            CloseOutcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}

const TICKET_PENDING: u8 = 0;
const TICKET_CLAIMED: u8 = 1;
const TICKET_ABANDONED: u8 = 2;

/// Decides who owns a queued batch: the worker (which applies it) or the
/// submitter (which withdraws it). Exactly one of `claim` and `abandon`
/// succeeds for a given ticket.
#[derive(Clone, Default)]
pub(crate) struct Ticket(Arc<AtomicU8>);

impl Ticket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the worker right before applying the batch.
    pub fn claim(&self) -> bool {
        self.transition(TICKET_CLAIMED)
    }

    /// Called by a submitter that no longer wants to wait.
    pub fn abandon(&self) -> bool {
        self.transition(TICKET_ABANDONED)
    }

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(TICKET_PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.0.load(Ordering::Acquire) {
            TICKET_PENDING => "pending",
            TICKET_CLAIMED => "claimed",
            _ => "abandoned",
        };
        f.debug_tuple("Ticket").field(&state).finish()
    }
}

/// Commands sent to the owner worker.
pub(crate) enum ManagerCommand<R> {
    /// Merge a batch into the collection
    Store {
        batch: Vec<Arc<R>>,
        ticket: Ticket,
        reply: oneshot::Sender<StoreOutcome>,
    },
    /// Stop the worker loop and acknowledge once stopped
    Shutdown { reply: oneshot::Sender<()> },
}

impl<R> Debug for ManagerCommand<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagerCommand::Store { batch, ticket, .. } => f
                .debug_struct("Store")
                .field("records", &batch.len())
                .field("ticket", ticket)
                .finish(),
            ManagerCommand::Shutdown { .. } => write!(f, "Shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_is_claimed_or_abandoned_never_both() {
        let t = Ticket::new();
        let other = t.clone();
        assert!(t.claim());
        assert!(!other.abandon());
        assert!(!other.claim());

        let t = Ticket::new();
        assert!(t.abandon());
        assert!(!t.claim());
    }

    #[test]
    fn concurrent_claim_and_abandon_have_one_winner() {
        for _ in 0..200 {
            let t = Ticket::new();
            let worker = t.clone();
            let handle = std::thread::spawn(move || worker.claim());
            let abandoned = t.abandon();
            let claimed = handle.join().unwrap();
            assert!(claimed ^ abandoned);
        }
    }
}
