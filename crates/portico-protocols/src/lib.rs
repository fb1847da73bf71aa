//! # Portico Protocols
//!
//! Core protocol definitions (traits) for the Portico kernel bridge.
//! Contains interface definitions and the small shared types that cross
//! crate boundaries.
//!
//! ## Core Traits
//!
//! - [`Transport`] - Blocking duplex channel used by a kernel worker thread
//! - [`Duplex`] - Async duplex channel owned by the event loop, one impl per network stack
//! - [`AppLoop`] - The external kernel message loop driven by a worker
//! - [`ReadinessCheck`] - Health collaborator behind the readiness endpoint
//! - [`PageSource`] - Page content collaborator behind the page-load endpoint

pub mod context;
pub mod error;
pub mod kernel;
pub mod page;
pub mod readiness;
pub mod transport;

pub use context::{AttachGuard, ContextInfo, KernelContext};
pub use error::{KernelError, PortalError, TransportError};
pub use kernel::AppLoop;
pub use page::PageSource;
pub use readiness::{ComponentHealth, HealthStatus, ReadinessCheck, ReadinessReport};
pub use transport::{Duplex, Inbound, Transport};
