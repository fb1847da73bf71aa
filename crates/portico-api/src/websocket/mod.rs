//! WebSocket kernel connections.
//!
//! - [`handler`]: axum endpoint that admits a connection and upgrades it
//! - [`supervisor`]: drives one connection from handshake to teardown
//! - [`duplex`]: [`portico_protocols::Duplex`] over an axum WebSocket
//! - [`tracker`]: connection lifecycle bookkeeping

pub mod duplex;
pub mod handler;
pub mod supervisor;
pub mod tracker;

pub use duplex::AxumDuplex;
pub use handler::{kernel_ws_handler, KernelQuery};
pub use supervisor::{ConnectionIds, ConnectionReport, ConnectionSupervisor, Termination};
pub use tracker::{ConnectionRecord, ConnectionState, ConnectionTracker, TrackedAttempt, TrackerStats};
