//! WebSocket kernel endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{debug, info};

use crate::state::BridgeState;

use super::duplex::AxumDuplex;

/// Query parameters of the kernel endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct KernelQuery {
    /// Per-attempt connection id. Older clients send it as `session_id`.
    #[serde(alias = "session_id")]
    pub connection_id: Option<String>,
}

/// `GET /jupyter/api/kernels/{id}/{name}`
///
/// Both the session cookie and the connection id must be present; otherwise
/// the handshake is refused with 403 and no kernel is started.
pub async fn kernel_ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path((kernel_id, channel)): Path<(String, String)>,
    Query(query): Query<KernelQuery>,
    jar: CookieJar,
    State(state): State<Arc<BridgeState>>,
) -> Response {
    let session_id = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let ids = match state
        .supervisor
        .admit(session_id.as_deref(), query.connection_id.as_deref())
    {
        Ok(ids) => ids,
        Err(e) => return e.into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    debug!(%kernel_id, %channel, "Upgrading kernel connection");
    let supervisor = Arc::clone(&state.supervisor);
    ws.max_message_size(state.config.websocket.max_message_size)
        .on_upgrade(move |socket| async move {
            let report = supervisor.run(ids, AxumDuplex::new(socket)).await;
            info!(
                termination = ?report.termination,
                worker_spawned = report.worker_spawned,
                "Kernel WebSocket finished"
            );
        })
}
