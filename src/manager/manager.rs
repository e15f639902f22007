//! Public handle of a cookie manager.
//!
//! A [`CookieManager`] owns exactly one ordered, unique-by-name collection of
//! records. All mutations are shipped to a dedicated owner worker thread and
//! applied there one batch at a time; reads load the last published version
//! of the collection and never wait for the worker.
//!
//! # Concurrency model
//! - `store*` blocks (or awaits) until the worker has merged the whole batch.
//!   Each call gets its own one-shot acknowledgment.
//! - `range`, `snapshot` and friends never block: the worker builds a new
//!   version on every batch and publishes it with a single atomic swap.
//! - `close*` flips the manager to closed exactly once and waits for the
//!   worker to stop. Afterwards stores are silent no-ops and reads keep
//!   returning the frozen collection.
//!
//! ```rust,no_run
//! use cookie_manager::{Cookie, CookieManager};
//!
//! let jar: CookieManager = CookieManager::new();
//! jar.store(vec![Cookie::new("sid", "1"), Cookie::new("theme", "dark")]);
//!
//! jar.range(|cookie| {
//!     println!("{}={}", cookie.name, cookie.value);
//!     true
//! });
//!
//! jar.close();
//! ```

use crate::config::ManagerConfig;
use crate::cookies::{cookies_from_headers, render_cookie_header, Cookie, Record};
use crate::errors::ManagerError;
use crate::manager::command::{CloseOutcome, ManagerCommand, StoreOutcome, Ticket};
use crate::manager::events::Subscription;
use crate::manager::snapshot::Snapshot;
use crate::manager::state::Shared;
use crate::manager::worker::OwnerWorker;
use http::{HeaderMap, HeaderValue};
use log::debug;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifier of a manager instance, used in log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ManagerId(Uuid);

impl ManagerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ManagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ManagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concurrency-safe, ordered, unique-by-name record collection.
///
/// Handles are cheap to clone and can be shared between threads. When the
/// last handle is dropped the worker stops on its own.
pub struct CookieManager<R: Record = Cookie> {
    shared: Arc<Shared<R>>,
    cmd_tx: mpsc::Sender<ManagerCommand<R>>,
}

impl<R: Record> CookieManager<R> {
    /// Creates a running manager with an empty collection and the default
    /// configuration.
    ///
    /// # Panics
    /// Panics if the operating system refuses to spawn the worker thread, just
    /// like [`std::thread::spawn`]. Use [`CookieManager::with_config`] to
    /// handle that case.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default()).expect("failed to spawn cookie manager worker")
    }

    /// Creates a running manager with an empty collection.
    pub fn with_config(config: ManagerConfig) -> Result<Self, ManagerError> {
        let id = ManagerId::new();
        let shared = Arc::new(Shared::new(id, config.event_capacity()));
        let (cmd_tx, cmd_rx) = mpsc::channel(config.queue_capacity());

        OwnerWorker::new(shared.clone(), cmd_rx).spawn(&config.worker_name)?;
        debug!(
            "CookieManager[{}]: created (queue capacity {})",
            id,
            config.queue_capacity()
        );

        Ok(Self { shared, cmd_tx })
    }

    pub fn id(&self) -> ManagerId {
        self.shared.id
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Merges `batch` into the collection and blocks until the worker has
    /// applied all of it.
    ///
    /// On a closed manager this returns [`StoreOutcome::Closed`] right away
    /// and changes nothing. Must not be called from inside a single-threaded
    /// async runtime; use [`CookieManager::store_async`] there.
    pub fn store<I>(&self, batch: I) -> StoreOutcome
    where
        I: IntoIterator,
        I::Item: Into<Arc<R>>,
    {
        if self.is_closed() {
            return StoreOutcome::Closed;
        }

        futures::executor::block_on(self.submit(collect(batch), std::future::pending()))
    }

    /// Async version of [`CookieManager::store`].
    pub async fn store_async<I>(&self, batch: I) -> StoreOutcome
    where
        I: IntoIterator,
        I::Item: Into<Arc<R>>,
    {
        self.submit(collect(batch), std::future::pending()).await
    }

    /// Like [`CookieManager::store_async`], but gives up when `token` is
    /// cancelled.
    ///
    /// A batch is never applied partially: [`StoreOutcome::Cancelled`] means
    /// nothing was applied, [`StoreOutcome::Applied`] means all of it was,
    /// even if the token fired while the worker was merging.
    pub async fn store_with_cancel<I>(&self, batch: I, token: &CancellationToken) -> StoreOutcome
    where
        I: IntoIterator,
        I::Item: Into<Arc<R>>,
    {
        self.submit(collect(batch), token.cancelled()).await
    }

    /// Like [`CookieManager::store_with_cancel`], with a deadline instead of a
    /// token. Needs a tokio runtime with timers enabled.
    pub async fn store_with_timeout<I>(&self, batch: I, timeout: Duration) -> StoreOutcome
    where
        I: IntoIterator,
        I::Item: Into<Arc<R>>,
    {
        self.submit(collect(batch), tokio::time::sleep(timeout)).await
    }

    async fn submit<C>(&self, batch: Vec<Arc<R>>, cancel: C) -> StoreOutcome
    where
        C: Future<Output = ()>,
    {
        if self.is_closed() {
            return StoreOutcome::Closed;
        }
        if batch.is_empty() {
            return StoreOutcome::Applied;
        }

        tokio::pin!(cancel);

        let permit = tokio::select! {
            biased;
            _ = &mut cancel => return StoreOutcome::Cancelled,
            permit = self.cmd_tx.reserve() => permit,
        };
        let Ok(permit) = permit else {
            // Worker is gone
            return StoreOutcome::Closed;
        };

        let ticket = Ticket::new();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        permit.send(ManagerCommand::Store {
            batch,
            ticket: ticket.clone(),
            reply: reply_tx,
        });

        tokio::select! {
            biased;
            res = &mut reply_rx => res.unwrap_or(StoreOutcome::Closed),
            _ = &mut cancel => {
                if ticket.abandon() {
                    StoreOutcome::Cancelled
                } else {
                    // The worker claimed the batch first; the merge is in
                    // memory and about to finish.
                    reply_rx.await.unwrap_or(StoreOutcome::Closed)
                }
            }
        }
    }

    /// Visits the records in collection order until `visit` returns `false`.
    ///
    /// Never waits for the worker. A store that has returned before this call
    /// started is always visible.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&R) -> bool,
    {
        let records = self.shared.current();
        for record in records.iter() {
            if !visit(&**record) {
                break;
            }
        }
    }

    /// Returns the current collection version.
    pub fn snapshot(&self) -> Snapshot<R> {
        self.shared.snapshot()
    }

    pub fn len(&self) -> usize {
        self.shared.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.current().is_empty()
    }

    /// Returns the record called `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<R>> {
        self.shared
            .current()
            .iter()
            .find(|r| r.name() == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shared.current().iter().any(|r| r.name() == name)
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> Subscription {
        self.shared.events.subscribe()
    }

    /// Closes the manager and blocks until the worker has stopped.
    ///
    /// Only the first call does anything; later (or concurrent) calls return
    /// [`CloseOutcome::AlreadyClosed`] immediately.
    pub fn close(&self) -> CloseOutcome {
        if self.is_closed() {
            return CloseOutcome::AlreadyClosed;
        }

        futures::executor::block_on(self.shutdown(std::future::pending()))
    }

    /// Async version of [`CookieManager::close`].
    pub async fn close_async(&self) -> CloseOutcome {
        self.shutdown(std::future::pending()).await
    }

    /// Closes the manager, but stops waiting for the worker when `token` is
    /// cancelled. The manager is closed either way.
    pub async fn close_with_cancel(&self, token: &CancellationToken) -> CloseOutcome {
        self.shutdown(token.cancelled()).await
    }

    /// Closes the manager, waiting at most `timeout` for the worker.
    pub async fn close_with_timeout(&self, timeout: Duration) -> CloseOutcome {
        self.shutdown(tokio::time::sleep(timeout)).await
    }

    async fn shutdown<C>(&self, cancel: C) -> CloseOutcome
    where
        C: Future<Output = ()>,
    {
        if !self.shared.begin_close() {
            return CloseOutcome::AlreadyClosed;
        }
        debug!("CookieManager[{}]: closing", self.shared.id);

        tokio::pin!(cancel);

        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = tokio::select! {
            biased;
            res = self.cmd_tx.send(ManagerCommand::Shutdown { reply: reply_tx }) => res,
            _ = &mut cancel => {
                // The worker drops every queued batch from now on and stops
                // once the last handle is gone
                debug!("CookieManager[{}]: close cancelled before shutdown was queued", self.shared.id);
                return CloseOutcome::Cancelled;
            }
        };
        if sent.is_err() {
            // Worker already stopped
            return CloseOutcome::Closed;
        }

        tokio::select! {
            biased;
            _ = reply_rx => CloseOutcome::Closed,
            _ = &mut cancel => CloseOutcome::Cancelled,
        }
    }
}

impl CookieManager<Cookie> {
    /// Stores every cookie found in the `Set-Cookie` headers of a response.
    pub fn store_response_headers(&self, headers: &HeaderMap) -> StoreOutcome {
        self.store(cookies_from_headers(headers))
    }

    /// Renders the current collection as a `Cookie` request header value.
    /// `None` when there are no cookies.
    pub fn request_header(&self) -> Option<HeaderValue> {
        let snapshot = self.snapshot();
        render_cookie_header(snapshot.iter())
    }
}

impl<R: Record> Default for CookieManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Clone for CookieManager<R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

impl<R: Record> Debug for CookieManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieManager")
            .field("id", &self.shared.id)
            .field("closed", &self.is_closed())
            .field("records", &self.len())
            .finish()
    }
}

fn collect<R, I>(batch: I) -> Vec<Arc<R>>
where
    I: IntoIterator,
    I::Item: Into<Arc<R>>,
{
    batch.into_iter().map(Into::into).collect()
}
