//! Bridge server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::BridgeError;
use crate::http::routes::create_router;
use crate::state::BridgeState;

/// The bridge server.
///
/// Stops accepting connections once the state's shutdown token is cancelled.
pub struct BridgeServer {
    state: Arc<BridgeState>,
}

impl BridgeServer {
    pub fn new(state: Arc<BridgeState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<BridgeState> {
        &self.state
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        let server = &self.state.config.server;
        format!("{}:{}", server.host, server.port)
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), BridgeError> {
        let addr: SocketAddr = self
            .addr()
            .parse()
            .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", self.addr(), e)))?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), BridgeError> {
        let app = create_router(self.state.clone());
        let shutdown = self.state.shutdown.clone();

        info!("Portico server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Portico server stopped");
        Ok(())
    }
}
