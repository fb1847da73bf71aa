//! Bridge error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use portico_core::RouterError;

/// Bridge error types.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A connection arrived without the identifiers needed to address a kernel.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The session router refused the connection.
    #[error("Routing failed: {0}")]
    Router(#[from] RouterError),

    /// Page not found.
    #[error("Page not found")]
    PageNotFound,

    /// Listener setup failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid listen address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl BridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProtocolViolation(_) | Self::Router(_) => StatusCode::FORBIDDEN,
            Self::PageNotFound => StatusCode::NOT_FOUND,
            Self::Io(_) | Self::InvalidAddress(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
