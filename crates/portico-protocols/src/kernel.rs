//! Kernel protocol definitions.
//!
//! The kernel is the application's per-connection message loop. The bridge
//! only drives it; what it does with messages is its own business.

use crate::context::KernelContext;
use crate::error::KernelError;
use crate::transport::Transport;

/// An application message loop driven by a kernel worker thread.
///
/// `run` is called on a dedicated blocking thread and owns the transport for
/// the lifetime of the call. Returning `Ok(())` or
/// `Err(KernelError::Disconnected)` ends the connection cleanly; any other
/// error is a worker fault.
pub trait AppLoop: Send + Sync + 'static {
    /// Kernel name, reported by the kernel info endpoint.
    fn name(&self) -> &str;

    fn run(&self, transport: &mut dyn Transport, context: &KernelContext)
        -> Result<(), KernelError>;
}
