//! Cross-thread call relay.
//!
//! A kernel worker runs on a blocking thread, but the socket it talks to is
//! owned by the event loop. The portal lets the worker submit async operations
//! to the event loop and block until they finish:
//!
//! ```text
//!   worker thread                      event loop
//!   ─────────────                      ──────────
//!   PortalHandle::call(f) ──job──▶  mpsc queue ──▶ Portal::run_until
//!        │ (blocks)                                   │ spawns f() as a task
//!        ◀──────────── oneshot(result) ───────────────┘
//! ```
//!
//! Stopping the portal with `cancel_remaining = true` aborts every call in
//! flight and drops every queued one, which wakes all blocked callers with
//! [`PortalError::Cancelled`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use portico_protocols::PortalError;

#[cfg(test)]
#[path = "portal_tests.rs"]
mod tests;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Default)]
struct Shared {
    stopped: CancellationToken,
    cancelled: CancellationToken,
    completed: AtomicU64,
}

/// Event-loop side of the relay. Owns the call queue and the running calls.
pub struct Portal {
    jobs: mpsc::UnboundedReceiver<Job>,
    tasks: JoinSet<()>,
    shared: Arc<Shared>,
    queue_closed: bool,
    queue_drained: bool,
    cancel_handled: bool,
}

/// Worker side of the relay.
#[derive(Clone)]
pub struct PortalHandle {
    jobs: mpsc::UnboundedSender<Job>,
    shared: Arc<Shared>,
}

impl Portal {
    /// Open a relay, returning the owner and a handle for the worker.
    pub fn open() -> (Portal, PortalHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        let portal = Portal {
            jobs: rx,
            tasks: JoinSet::new(),
            shared: Arc::clone(&shared),
            queue_closed: false,
            queue_drained: false,
            cancel_handled: false,
        };
        (portal, PortalHandle { jobs: tx, shared })
    }

    /// Serve calls until `until` completes, then return its output.
    ///
    /// Each call runs as its own task so a long call (a pending receive) does
    /// not hold up a send issued from another kernel thread.
    pub async fn run_until<F: Future>(&mut self, until: F) -> F::Output {
        let stopped = self.shared.stopped.clone();
        let cancelled = self.shared.cancelled.clone();
        tokio::pin!(until);

        loop {
            tokio::select! {
                biased;

                _ = cancelled.cancelled(), if !self.cancel_handled => {
                    self.cancel_all();
                }
                _ = stopped.cancelled(), if !self.queue_closed => {
                    self.jobs.close();
                    self.queue_closed = true;
                }
                output = &mut until => return output,
                job = self.jobs.recv(), if !self.queue_drained => match job {
                    Some(job) => {
                        self.tasks.spawn(job());
                    }
                    None => self.queue_drained = true,
                },
                Some(result) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.reap(result);
                }
            }
        }
    }

    /// Stop accepting calls.
    ///
    /// With `cancel_remaining` every queued or running call is cancelled;
    /// otherwise queued calls are still run. Returns once no call is left.
    pub async fn stop(&mut self, cancel_remaining: bool) {
        self.shared.stopped.cancel();
        self.jobs.close();
        self.queue_closed = true;

        if cancel_remaining {
            self.shared.cancelled.cancel();
            self.cancel_all();
        } else {
            while let Some(job) = self.jobs.recv().await {
                self.tasks.spawn(job());
            }
            self.queue_drained = true;
        }

        while let Some(result) = self.tasks.join_next().await {
            self.reap(result);
        }
        debug!(
            completed = self.calls_completed(),
            cancel_remaining, "Portal stopped"
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.is_cancelled()
    }

    /// Number of calls that ran to completion.
    pub fn calls_completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Number of calls currently running on the event loop.
    pub fn calls_in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn cancel_all(&mut self) {
        self.jobs.close();
        self.queue_closed = true;
        // Dropping a queued job drops its result sender, which wakes the caller.
        while self.jobs.try_recv().is_ok() {}
        self.queue_drained = true;
        self.cancel_handled = true;
        self.tasks.abort_all();
    }

    fn reap(&self, result: Result<(), JoinError>) {
        match result {
            Ok(()) => {
                self.shared.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_panic() => warn!("Portal call panicked: {}", e),
            Err(_) => {}
        }
    }
}

impl Drop for Portal {
    fn drop(&mut self) {
        self.shared.stopped.cancel();
        self.shared.cancelled.cancel();
    }
}

impl PortalHandle {
    /// Run `f` on the event loop and block until it finishes.
    ///
    /// Must be called from a blocking context such as a worker thread; calling
    /// it from inside an async task panics, like tokio's own blocking receives.
    pub fn call<F, Fut, T>(&self, f: F) -> Result<T, PortalError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.shared.stopped.is_cancelled() {
            return Err(PortalError::Stopped);
        }

        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let _ = tx.send(f().await);
            })
        });

        self.jobs.send(job).map_err(|_| PortalError::Stopped)?;
        rx.blocking_recv().map_err(|_| PortalError::Cancelled)
    }

    /// Stop the relay from the worker side.
    pub fn stop(&self, cancel_remaining: bool) {
        self.shared.stopped.cancel();
        if cancel_remaining {
            self.shared.cancelled.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.is_cancelled()
    }
}
