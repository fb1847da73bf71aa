//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::trace::TraceLayer;

use crate::http::{control, monitoring, page};
use crate::state::BridgeState;
use crate::websocket::kernel_ws_handler;

/// Create the bridge router.
///
/// ## Route Structure
///
/// ```text
/// GET  /jupyter/api/kernels/{id}/{name}    - Kernel WebSocket
/// GET  /jupyter/api/kernels/{id}           - Kernel info
/// POST /_portico/api/close/{connection_id} - Close a connection's kernel context
///
/// /readyz  - Readiness probe (Kubernetes)
/// /livez   - Liveness probe (Kubernetes)
///
/// GET  /, /{*path}                         - Page load, sets the session cookie
/// ```
pub fn create_router(state: Arc<BridgeState>) -> Router {
    let gzip_min_size = state.config.server.gzip_min_size;

    let kernel_routes = Router::new()
        .route("/kernels/{id}/{name}", get(kernel_ws_handler))
        .route("/kernels/{id}", get(control::kernel_info))
        .with_state(state.clone());

    let control_routes = Router::new()
        .route("/close/{connection_id}", post(control::close_connection))
        .with_state(state.clone());

    let monitoring_routes = Router::new()
        .route("/readyz", get(monitoring::readiness_probe))
        .with_state(state.clone());

    // Liveness probe has no state dependency
    let liveness_route = Router::new().route("/livez", get(monitoring::liveness_probe));

    let page_routes = Router::new()
        .route("/", get(page::page_handler))
        .route("/{*path}", get(page::page_handler))
        .with_state(state);

    Router::new()
        .nest("/jupyter/api", kernel_routes)
        .nest("/_portico/api", control_routes)
        .merge(monitoring_routes)
        .merge(liveness_route)
        .merge(page_routes)
        .layer(CompressionLayer::new().compress_when(SizeAbove::new(gzip_min_size)))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
