//! Readiness and liveness probes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tokio_util::sync::CancellationToken;

use portico_core::SessionRouter;
use portico_protocols::{ComponentHealth, HealthStatus, ReadinessCheck, ReadinessReport};

use crate::state::BridgeState;
use crate::websocket::ConnectionTracker;

/// Built-in readiness check: reports kernel and connection counts, and turns
/// unhealthy once shutdown has begun.
pub struct BridgeReadiness {
    router: Arc<SessionRouter>,
    tracker: Arc<ConnectionTracker>,
    shutdown: CancellationToken,
}

impl BridgeReadiness {
    pub fn new(
        router: Arc<SessionRouter>,
        tracker: Arc<ConnectionTracker>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            router,
            tracker,
            shutdown,
        }
    }
}

#[async_trait]
impl ReadinessCheck for BridgeReadiness {
    async fn check(&self) -> ReadinessReport {
        let stats = self.tracker.stats();
        let server = if self.shutdown.is_cancelled() {
            ComponentHealth::new("server", HealthStatus::Unhealthy).with_message("shutting down")
        } else {
            ComponentHealth::new("server", HealthStatus::Healthy)
        };

        ReadinessReport::from_components(vec![
            server,
            ComponentHealth::new("kernels", HealthStatus::Healthy)
                .with_message(format!("{} contexts", self.router.len())),
            ComponentHealth::new("connections", HealthStatus::Healthy).with_message(format!(
                "{} active, {} running",
                stats.active, stats.running
            )),
        ])
    }
}

/// Liveness probe (Kubernetes).
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive"
    }))
}

/// Readiness probe (Kubernetes). 503 when the check reports unhealthy.
pub async fn readiness_probe(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    let report = state.readiness.check().await;
    let status = if report.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
