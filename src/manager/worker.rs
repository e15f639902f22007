use crate::cookies::Record;
use crate::manager::command::{ManagerCommand, StoreOutcome, Ticket};
use crate::manager::events::ManagerEvent;
use crate::manager::state::Shared;
use log::{debug, trace};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// The single owner of a manager collection.
///
/// Runs on a dedicated thread and handles one command at a time, in queue
/// order. It is the only place where a new collection version is built and
/// published.
pub(crate) struct OwnerWorker<R> {
    shared: Arc<Shared<R>>,
    cmd_rx: mpsc::Receiver<ManagerCommand<R>>,
    /// Private copy of the last published version
    records: Arc<Vec<Arc<R>>>,
}

impl<R: Record> OwnerWorker<R> {
    pub fn new(shared: Arc<Shared<R>>, cmd_rx: mpsc::Receiver<ManagerCommand<R>>) -> Self {
        let records = shared.current();
        Self {
            shared,
            cmd_rx,
            records,
        }
    }

    pub fn spawn(self, name: &str) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run())
    }

    /// Runs the command loop until a shutdown request arrives or every
    /// manager handle has been dropped.
    pub fn run(mut self) {
        debug!("CookieManager[{}]: worker started", self.shared.id);

        let mut ack = None;
        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            match cmd {
                ManagerCommand::Store {
                    batch,
                    ticket,
                    reply,
                } => {
                    let outcome = self.handle_store(batch, &ticket);
                    // The submitter may have given up waiting
                    let _ = reply.send(outcome);
                }
                ManagerCommand::Shutdown { reply } => {
                    ack = Some(reply);
                    break;
                }
            }
        }

        self.finish(ack);
    }

    fn handle_store(&mut self, batch: Vec<Arc<R>>, ticket: &Ticket) -> StoreOutcome {
        if self.shared.is_closed() {
            debug!(
                "CookieManager[{}]: dropping batch of {} record(s), manager is closed",
                self.shared.id,
                batch.len()
            );
            return StoreOutcome::Closed;
        }

        if !ticket.claim() {
            trace!("CookieManager[{}]: batch withdrawn by submitter", self.shared.id);
            return StoreOutcome::Cancelled;
        }

        let mut next = Vec::clone(&self.records);
        let (added, updated) = merge(&mut next, batch);

        let next = Arc::new(next);
        self.shared.publish(next.clone());
        self.records = next;

        trace!(
            "CookieManager[{}]: merged batch, added={:?} updated={:?} total={}",
            self.shared.id,
            added,
            updated,
            self.records.len()
        );

        self.shared
            .events
            .publish(ManagerEvent::Stored { added, updated });

        StoreOutcome::Applied
    }

    fn finish(mut self, ack: Option<oneshot::Sender<()>>) {
        // Reached without a shutdown request when all handles are gone
        self.shared.begin_close();

        // Release everybody still queued; their replies are dropped unanswered.
        // blocking_recv also waits for submitters holding a reserved permit,
        // try_recv would report those as empty and strand them.
        self.cmd_rx.close();
        let mut dropped = 0usize;
        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            trace!("CookieManager[{}]: discarding {:?}", self.shared.id, cmd);
            dropped += 1;
        }

        debug!(
            "CookieManager[{}]: worker stopped ({} record(s), {} pending request(s) discarded)",
            self.shared.id,
            self.records.len(),
            dropped
        );

        self.shared.events.publish(ManagerEvent::Closed);

        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }
}

/// Merges `batch` into `records`: a record whose name is already present
/// replaces the existing one at its position, anything else is appended.
///
/// Returns the names that were added and updated, in batch order.
pub(crate) fn merge<R: Record>(
    records: &mut Vec<Arc<R>>,
    batch: Vec<Arc<R>>,
) -> (Vec<String>, Vec<String>) {
    let mut added = Vec::new();
    let mut updated = Vec::new();

    for record in batch {
        let name = record.name().to_string();
        match records.iter().position(|r| r.name() == name) {
            Some(idx) => {
                records[idx] = record;
                updated.push(name);
            }
            None => {
                records.push(record);
                added.push(name);
            }
        }
    }

    (added, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::Cookie;

    fn cookies(pairs: &[(&str, &str)]) -> Vec<Arc<Cookie>> {
        pairs
            .iter()
            .map(|(n, v)| Arc::new(Cookie::new(*n, *v)))
            .collect()
    }

    fn pairs(records: &[Arc<Cookie>]) -> Vec<(String, String)> {
        records
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    #[test]
    fn existing_name_keeps_its_position() {
        let mut records = cookies(&[("a", "1")]);

        let (added, updated) = merge(&mut records, cookies(&[("a", "2"), ("b", "1")]));

        assert_eq!(added, vec!["b"]);
        assert_eq!(updated, vec!["a"]);
        assert_eq!(
            pairs(&records),
            vec![("a".into(), "2".into()), ("b".into(), "1".into())]
        );
    }

    #[test]
    fn duplicate_names_within_a_batch_collapse() {
        let mut records = Vec::new();

        merge(&mut records, cookies(&[("x", "1"), ("y", "1"), ("x", "2")]));

        assert_eq!(
            pairs(&records),
            vec![("x".into(), "2".into()), ("y".into(), "1".into())]
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut records = cookies(&[("SID", "1")]);
        merge(&mut records, cookies(&[("sid", "2")]));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn worker_stops_when_all_senders_are_gone() {
        let shared = Arc::new(Shared::<Cookie>::new(crate::manager::ManagerId::new(), 4));
        let mut events = shared.events.subscribe();
        let (tx, rx) = mpsc::channel(4);

        let handle = OwnerWorker::new(shared.clone(), rx).spawn("test-worker").unwrap();
        drop(tx);
        handle.join().unwrap();

        assert!(shared.is_closed());
        assert_eq!(events.try_recv().unwrap(), ManagerEvent::Closed);
    }

    #[test]
    fn abandoned_ticket_is_not_applied() {
        let shared = Arc::new(Shared::<Cookie>::new(crate::manager::ManagerId::new(), 4));
        let (tx, rx) = mpsc::channel(4);

        let ticket = Ticket::new();
        assert!(ticket.abandon());

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.blocking_send(ManagerCommand::Store {
            batch: cookies(&[("a", "1")]),
            ticket,
            reply: reply_tx,
        })
        .unwrap();
        drop(tx);

        OwnerWorker::new(shared.clone(), rx).run();

        assert_eq!(reply_rx.blocking_recv().unwrap(), StoreOutcome::Cancelled);
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn reserved_submitter_is_released_on_shutdown() {
        let shared = Arc::new(Shared::<Cookie>::new(crate::manager::ManagerId::new(), 4));
        let (tx, rx) = mpsc::channel(4);

        // A submitter that got its permit before the manager was closed
        let permit = tx.try_reserve().unwrap();

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.blocking_send(ManagerCommand::Shutdown { reply: ack_tx }).unwrap();
        shared.begin_close();

        let worker = OwnerWorker::new(shared.clone(), rx).spawn("test-worker").unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        permit.send(ManagerCommand::Store {
            batch: cookies(&[("late", "1")]),
            ticket: Ticket::new(),
            reply: reply_tx,
        });

        // Reply sender must be dropped, not left dangling in the queue
        assert!(reply_rx.blocking_recv().is_err());
        worker.join().unwrap();
        ack_rx.blocking_recv().unwrap();

        assert!(shared.snapshot().is_empty());
        drop(tx);
    }

    #[test]
    fn batch_queued_before_close_is_dropped_after_close() {
        let shared = Arc::new(Shared::<Cookie>::new(crate::manager::ManagerId::new(), 4));
        shared.publish(Arc::new(cookies(&[("a", "1")])));
        let mut events = shared.events.subscribe();
        let (tx, rx) = mpsc::channel(4);

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.blocking_send(ManagerCommand::Store {
            batch: cookies(&[("a", "2"), ("b", "1")]),
            ticket: Ticket::new(),
            reply: reply_tx,
        })
        .unwrap();

        assert!(shared.begin_close());

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.blocking_send(ManagerCommand::Shutdown { reply: ack_tx }).unwrap();

        OwnerWorker::new(shared.clone(), rx).run();

        assert_eq!(reply_rx.blocking_recv().unwrap(), StoreOutcome::Closed);
        ack_rx.blocking_recv().unwrap();
        assert_eq!(pairs(shared.snapshot().as_slice()), vec![("a".into(), "1".into())]);

        // Only the shutdown notification, no Stored
        assert_eq!(events.try_recv().unwrap(), ManagerEvent::Closed);
        assert!(events.try_recv().is_err());
        drop(tx);
    }
}
