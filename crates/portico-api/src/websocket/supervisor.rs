//! Connection supervisor.
//!
//! Owns one kernel connection from handshake to teardown:
//!
//! ```text
//! admit ids ──▶ resolve context ──▶ open portal ──▶ spawn worker
//!                                                      │
//!     close transport (once) ◀── stop portal ◀── worker exits / shutdown
//! ```
//!
//! The transport is closed exactly once on every path out, including when the
//! supervising future itself is dropped.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use portico_core::{spawn_worker, GuardedDuplex, Portal, SessionRouter, WorkerExit};
use portico_protocols::{AppLoop, Duplex};

use super::tracker::{ConnectionState, ConnectionTracker};
use crate::error::BridgeError;

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

/// Identifiers of an admitted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIds {
    pub session_id: String,
    pub connection_id: String,
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The kernel loop returned on its own.
    Completed,
    /// The remote hung up.
    Disconnected,
    /// Refused before a worker was started.
    Rejected(String),
    /// The kernel loop failed or panicked.
    Faulted(String),
    /// The server is shutting down.
    Shutdown,
}

impl Termination {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Completed | Self::Disconnected | Self::Shutdown)
    }
}

/// Outcome of one supervised connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub termination: Termination,
    /// Whether a kernel worker was started.
    pub worker_spawned: bool,
    /// Whether the worker had cancelled its portal by the time it was joined.
    pub relay_cancelled_by_worker: bool,
}

impl ConnectionReport {
    fn rejected(reason: String) -> Self {
        Self {
            termination: Termination::Rejected(reason),
            worker_spawned: false,
            relay_cancelled_by_worker: false,
        }
    }
}

pub struct ConnectionSupervisor {
    router: Arc<SessionRouter>,
    app: Arc<dyn AppLoop>,
    tracker: Arc<ConnectionTracker>,
    shutdown: CancellationToken,
}

impl ConnectionSupervisor {
    pub fn new(
        router: Arc<SessionRouter>,
        app: Arc<dyn AppLoop>,
        tracker: Arc<ConnectionTracker>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            router,
            app,
            tracker,
            shutdown,
        }
    }

    pub fn tracker(&self) -> &Arc<ConnectionTracker> {
        &self.tracker
    }

    /// Check that both identifiers are present.
    pub fn admit(
        &self,
        session_id: Option<&str>,
        connection_id: Option<&str>,
    ) -> Result<ConnectionIds, BridgeError> {
        let session_id = match session_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                error!("No session cookie");
                return Err(BridgeError::ProtocolViolation("no session cookie".to_string()));
            }
        };
        let connection_id = match connection_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                error!(session_id, "No connection id");
                return Err(BridgeError::ProtocolViolation("no connection id".to_string()));
            }
        };

        Ok(ConnectionIds {
            session_id: session_id.to_string(),
            connection_id: connection_id.to_string(),
        })
    }

    /// Admit and run a connection. A rejected connection is closed without
    /// starting a worker.
    pub async fn serve<D: Duplex>(
        &self,
        session_id: Option<&str>,
        connection_id: Option<&str>,
        duplex: D,
    ) -> ConnectionReport {
        match self.admit(session_id, connection_id) {
            Ok(ids) => self.run(ids, duplex).await,
            Err(e) => {
                close_quietly(&duplex).await;
                ConnectionReport::rejected(e.to_string())
            }
        }
    }

    /// Run an admitted connection until its kernel ends or the server shuts down.
    pub async fn run<D: Duplex>(&self, ids: ConnectionIds, duplex: D) -> ConnectionReport {
        let span = info_span!(
            "connection",
            session_id = %ids.session_id,
            connection_id = %ids.connection_id
        );
        self.run_inner(ids, duplex).instrument(span).await
    }

    async fn run_inner<D: Duplex>(&self, ids: ConnectionIds, duplex: D) -> ConnectionReport {
        let attempt = self.tracker.track(&ids);
        let duplex = Arc::new(GuardedDuplex::new(duplex));
        let guard = CloseGuard::new(Arc::clone(&duplex));

        let context = match self.router.resolve(&ids.session_id, &ids.connection_id) {
            Ok(context) => context,
            Err(e) => {
                error!("Connection rejected: {}", e);
                guard.close().await;
                let report = ConnectionReport::rejected(e.to_string());
                attempt.finish(&report.termination);
                return report;
            }
        };
        attempt.transition(ConnectionState::Accepted);

        let (mut portal, handle) = Portal::open();
        let worker = spawn_worker(Arc::clone(&self.app), context, handle, Arc::clone(&duplex));
        attempt.transition(ConnectionState::Running);
        info!("Kernel connection running");

        let shutdown = self.shutdown.clone();
        let joined = portal
            .run_until(async move {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => None,
                    joined = worker => Some(joined),
                }
            })
            .await;
        let relay_cancelled_by_worker = portal.is_cancelled();

        let termination = match joined {
            None => {
                info!("Server shutting down, cancelling kernel connection");
                portal.stop(true).await;
                Termination::Shutdown
            }
            Some(Ok(Ok(exit))) => {
                portal.stop(false).await;
                match exit {
                    WorkerExit::Completed => Termination::Completed,
                    WorkerExit::Disconnected => Termination::Disconnected,
                }
            }
            Some(Ok(Err(e))) => {
                error!("Kernel worker failed: {}", e);
                portal.stop(true).await;
                Termination::Faulted(e.to_string())
            }
            Some(Err(e)) => {
                if e.is_panic() {
                    error!("Kernel worker panicked");
                } else {
                    warn!("Kernel worker aborted: {}", e);
                }
                portal.stop(true).await;
                Termination::Faulted(e.to_string())
            }
        };

        guard.close().await;
        attempt.finish(&termination);
        info!(?termination, "Kernel connection terminated");

        ConnectionReport {
            termination,
            worker_spawned: true,
            relay_cancelled_by_worker,
        }
    }
}

/// Closes the transport when released or dropped, whichever comes first.
struct CloseGuard<T: Duplex> {
    duplex: Option<Arc<T>>,
}

impl<T: Duplex> CloseGuard<T> {
    fn new(duplex: Arc<T>) -> Self {
        Self {
            duplex: Some(duplex),
        }
    }

    async fn close(mut self) {
        if let Some(duplex) = self.duplex.take() {
            close_quietly(duplex.as_ref()).await;
        }
    }
}

impl<T: Duplex> Drop for CloseGuard<T> {
    fn drop(&mut self) {
        let Some(duplex) = self.duplex.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { close_quietly(duplex.as_ref()).await });
            }
            Err(_) => debug!("No runtime to close the transport on"),
        }
    }
}

async fn close_quietly<T: Duplex + ?Sized>(duplex: &T) {
    if let Err(e) = duplex.close().await {
        debug!("Transport close failed: {}", e);
    }
}
