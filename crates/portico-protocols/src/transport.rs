//! Transport protocol definitions.
//!
//! A connection's network I/O has two faces:
//!
//! - **Duplex**: the async side, owned by the event loop and implemented once
//!   per network stack (axum WebSockets, in-memory doubles for tests).
//! - **Transport**: the blocking side handed to a kernel worker thread. Every
//!   call on it is relayed back to the event loop that owns the [`Duplex`].

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// A message received from the remote end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Bytes),
    /// The remote closed the connection.
    Disconnected,
}

impl Inbound {
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Text payload, if this is a text frame.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Binary payload, if this is a binary frame.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Blocking duplex channel driven by one kernel worker thread.
///
/// `receive` blocks until a frame arrives, the remote closes, or an error
/// occurs. A remote close is reported as `Ok(Inbound::Disconnected)` so
/// callers can tell a graceful ending from a failure.
pub trait Transport: Send {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError>;

    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    fn receive(&mut self) -> Result<Inbound, TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;
}

/// Async duplex channel owned by the event loop.
///
/// Implementations take `&self` so that a pending `receive` does not block a
/// concurrent `send_*` issued from another thread of the same kernel.
#[async_trait]
pub trait Duplex: Send + Sync + 'static {
    async fn send_text(&self, payload: String) -> Result<(), TransportError>;

    async fn send_bytes(&self, payload: Bytes) -> Result<(), TransportError>;

    async fn receive(&self) -> Result<Inbound, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
