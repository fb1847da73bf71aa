//! # Portico API
//!
//! HTTP and WebSocket surface of the Portico kernel bridge.
//!
//! ## Architecture
//!
//! ```text
//!  browser ──ws──▶ kernel_ws_handler ──▶ ConnectionSupervisor
//!                                          │  SessionRouter::resolve
//!                                          │  Portal::open
//!                                          ▼
//!                  AxumDuplex ◀──portal── kernel worker (blocking thread)
//! ```
//!
//! The HTTP routes around it issue the session cookie, close kernel contexts
//! on request and report readiness.

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::BridgeError;
pub use http::monitoring::BridgeReadiness;
pub use http::page::StaticPage;
pub use http::routes::create_router;
pub use server::BridgeServer;
pub use state::{BridgeState, BridgeStateBuilder};
pub use websocket::{
    AxumDuplex, ConnectionIds, ConnectionReport, ConnectionState, ConnectionSupervisor,
    ConnectionTracker, Termination,
};
