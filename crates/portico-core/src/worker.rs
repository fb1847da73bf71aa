//! Kernel worker loop.
//!
//! A worker drives one kernel's message loop on a blocking-pool thread. All of
//! its network I/O goes through a [`PortalTransport`], which relays every
//! operation to the event loop that owns the connection.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span};

use portico_protocols::{AppLoop, Duplex, Inbound, KernelContext, KernelError, Transport, TransportError};

use crate::portal::PortalHandle;

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

/// Blocking transport that relays each operation through the portal.
pub struct PortalTransport<D> {
    portal: PortalHandle,
    duplex: Arc<D>,
}

impl<D: Duplex> PortalTransport<D> {
    pub fn new(portal: PortalHandle, duplex: Arc<D>) -> Self {
        Self { portal, duplex }
    }
}

impl<D: Duplex> Transport for PortalTransport<D> {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        let duplex = Arc::clone(&self.duplex);
        let payload = payload.to_string();
        self.portal
            .call(move || async move { duplex.send_text(payload).await })?
    }

    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let duplex = Arc::clone(&self.duplex);
        let payload = Bytes::copy_from_slice(payload);
        self.portal
            .call(move || async move { duplex.send_bytes(payload).await })?
    }

    fn receive(&mut self) -> Result<Inbound, TransportError> {
        let duplex = Arc::clone(&self.duplex);
        self.portal
            .call(move || async move { duplex.receive().await })?
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let duplex = Arc::clone(&self.duplex);
        self.portal
            .call(move || async move { duplex.close().await })?
    }
}

/// How a kernel loop ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The kernel loop returned on its own.
    Completed,
    /// The remote hung up.
    Disconnected,
}

/// Run `app` against `transport` on the current thread.
///
/// On an error or a panic the portal is stopped with `cancel_remaining` so
/// that no relayed call outlives the worker, and the failure is passed on: the
/// error is returned, the panic resumed.
pub fn run_worker(
    app: &dyn AppLoop,
    transport: &mut dyn Transport,
    context: &KernelContext,
    portal: &PortalHandle,
) -> Result<WorkerExit, KernelError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| app.run(transport, context)));

    match outcome {
        Ok(Ok(())) => Ok(WorkerExit::Completed),
        Ok(Err(KernelError::Disconnected)) => Ok(WorkerExit::Disconnected),
        Ok(Err(e)) => {
            error!(kernel = app.name(), "Kernel loop failed: {}", e);
            portal.stop(true);
            Err(e)
        }
        Err(payload) => {
            error!(kernel = app.name(), "Kernel loop panicked");
            portal.stop(true);
            panic::resume_unwind(payload)
        }
    }
}

/// Start a worker for `context` on the blocking pool.
///
/// The returned handle yields the worker's result; a panic inside the kernel
/// loop surfaces as a panicked [`tokio::task::JoinError`].
pub fn spawn_worker<D: Duplex>(
    app: Arc<dyn AppLoop>,
    context: Arc<KernelContext>,
    portal: PortalHandle,
    duplex: Arc<D>,
) -> JoinHandle<Result<WorkerExit, KernelError>> {
    tokio::task::spawn_blocking(move || {
        let span = info_span!(
            "kernel_worker",
            connection_id = context.connection_id(),
            session_id = context.session_id()
        );
        let _entered = span.enter();
        let _attached = context.attach();

        info!(kernel = app.name(), "Kernel worker started");
        let mut transport = PortalTransport::new(portal.clone(), duplex);
        let result = run_worker(app.as_ref(), &mut transport, &context, &portal);
        if let Ok(exit) = &result {
            info!(?exit, "Kernel worker finished");
        }
        result
    })
}
