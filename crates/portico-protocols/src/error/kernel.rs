//! Kernel loop errors.

use thiserror::Error;

use super::TransportError;

#[derive(Debug, Error)]
pub enum KernelError {
    /// The remote closed the connection. This is a clean ending, not a fault.
    #[error("Kernel connection disconnected")]
    Disconnected,

    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Kernel fault: {0}")]
    Fault(String),
}

impl KernelError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl From<TransportError> for KernelError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Disconnected => Self::Disconnected,
            other => Self::Transport(other),
        }
    }
}
