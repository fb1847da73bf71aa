//! Core error types.

use thiserror::Error;

/// Errors raised while addressing a kernel context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Session or connection id missing.
    #[error("Missing {0}")]
    MissingIdentifier(&'static str),

    /// The connection id is already bound to another session.
    #[error("Connection {connection_id} belongs to another session")]
    SessionMismatch { connection_id: String },
}
