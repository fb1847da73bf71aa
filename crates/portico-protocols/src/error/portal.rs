//! Call relay errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// The relay no longer accepts calls.
    #[error("Portal stopped")]
    Stopped,

    /// The call was accepted but cancelled before it completed.
    #[error("Portal call cancelled")]
    Cancelled,
}
