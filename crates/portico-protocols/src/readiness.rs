//! Readiness protocol definitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy.
    Healthy,
    /// Service is degraded but functional.
    Degraded,
    /// Service is unhealthy.
    Unhealthy,
}

/// Component health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name.
    pub name: String,
    /// Component status.
    pub status: HealthStatus,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Readiness report returned by a [`ReadinessCheck`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Component health checks.
    pub components: Vec<ComponentHealth>,
}

impl ReadinessReport {
    /// Build a report whose overall status is the worst component status.
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self { status, components }
    }

    /// Whether the server should receive traffic.
    pub fn is_ready(&self) -> bool {
        self.status != HealthStatus::Unhealthy
    }
}

/// Collaborator deciding whether the server is ready.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    async fn check(&self) -> ReadinessReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialize() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_report_takes_worst_status() {
        let report = ReadinessReport::from_components(vec![
            ComponentHealth::new("a", HealthStatus::Healthy),
            ComponentHealth::new("b", HealthStatus::Degraded),
        ]);
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(report.is_ready());

        let report = ReadinessReport::from_components(vec![
            ComponentHealth::new("a", HealthStatus::Degraded),
            ComponentHealth::new("b", HealthStatus::Unhealthy).with_message("down"),
        ]);
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.is_ready());
    }

    #[test]
    fn test_empty_report_is_healthy() {
        let report = ReadinessReport::from_components(Vec::new());
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_component_message_skipped_when_none() {
        let json = serde_json::to_string(&ComponentHealth::new("api", HealthStatus::Healthy))
            .unwrap();
        assert!(!json.contains("message"));
    }
}
