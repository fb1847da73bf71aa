//! Kernel control endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::state::BridgeState;

/// Kernel description returned by the kernel-info endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct KernelInfo {
    pub id: String,
    pub name: String,
}

/// `GET /jupyter/api/kernels/{id}`
pub async fn kernel_info(Path(id): Path<String>) -> Json<KernelInfo> {
    Json(KernelInfo {
        id,
        name: "portico".to_string(),
    })
}

/// `POST /_portico/api/close/{connection_id}`
///
/// Closes the kernel context of a connection. Answers 200 with an empty body
/// whether or not the context existed.
pub async fn close_connection(
    State(state): State<Arc<BridgeState>>,
    Path(connection_id): Path<String>,
) -> StatusCode {
    if state.router.close(&connection_id) {
        info!(%connection_id, "Connection closed by client request");
    }
    StatusCode::OK
}
