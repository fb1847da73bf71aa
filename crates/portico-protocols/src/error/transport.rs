//! Transport errors.

use thiserror::Error;

use super::PortalError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote end closed the connection.
    #[error("Transport disconnected")]
    Disconnected,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Close failed: {0}")]
    Close(String),

    /// The call could not be relayed to the event loop.
    #[error("Relay failed: {0}")]
    Relay(#[from] PortalError),
}

impl TransportError {
    /// Whether this error means the remote went away rather than a fault.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let err = TransportError::Disconnected;
        assert!(err.to_string().contains("disconnected"));
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_send_failed_error() {
        let err = TransportError::Send("broken pipe".to_string());
        let display = err.to_string();
        assert!(display.contains("Send failed"));
        assert!(display.contains("broken pipe"));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_relay_error_from_portal() {
        let err = TransportError::from(PortalError::Cancelled);
        assert_eq!(err, TransportError::Relay(PortalError::Cancelled));
        assert!(err.to_string().contains("cancelled"));
    }
}
