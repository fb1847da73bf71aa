//! # Portico Core
//!
//! The kernel bridge: runs one application kernel per connection on a
//! blocking worker thread while the connection's socket stays on the event
//! loop.
//!
//! ## Components
//!
//! - [`Portal`] / [`PortalHandle`] - Cross-thread call relay from a worker to the event loop
//! - [`SessionRouter`] - Maps (session, connection) ids to kernel contexts
//! - [`ContextStore`] - Injected storage behind the router
//! - [`spawn_worker`] / [`run_worker`] - The per-connection kernel worker loop
//! - [`GuardedDuplex`] - Close-once wrapper shared by a worker and its supervisor
//! - [`StateKernel`] - Built-in JSON key/value kernel

pub mod duplex;
pub mod error;
pub mod portal;
pub mod router;
pub mod state_kernel;
pub mod store;
pub mod worker;

pub use duplex::{DuplexProbe, GuardedDuplex, MemoryDuplex, MemoryPeer, OutboundFrame};
pub use error::RouterError;
pub use portal::{Portal, PortalHandle};
pub use router::SessionRouter;
pub use state_kernel::StateKernel;
pub use store::{ContextStore, MemoryContextStore};
pub use worker::{run_worker, spawn_worker, PortalTransport, WorkerExit};
