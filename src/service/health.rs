//! Health checks and monitoring
//!
//! This module provides health check functionality for the skeeboard
//! service, including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Value reported on the health status gauge
    pub fn gauge_value(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    fn worst(self, other: HealthStatus) -> HealthStatus {
        if self.gauge_value() <= other.gauge_value() {
            self
        } else {
            other
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub players_tracked: usize,
    pub venues: usize,
    pub pending_applications: usize,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let checks = vec![
            Self::check_service_running(&app_state).await,
            Self::check_session_store(&app_state),
            Self::check_application_store(&app_state),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |status, check| status.worst(check.status));

        let metrics = app_state.metrics();
        metrics.update_health_status(status.gauge_value());
        metrics.set_uptime(app_state.uptime());
        for check in &checks {
            metrics.update_component_health(&check.name, check.status != HealthStatus::Unhealthy);
        }

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats: Self::gather_service_stats(&app_state),
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_session_store(&app_state)
            .status
            .worst(Self::check_application_store(&app_state).status))
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// The session store must answer for the service to be usable
    fn check_session_store(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.ledger().store().player_count() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Session store check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Session store unavailable: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "session_store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Sessions can still be submitted without the application store
    fn check_application_store(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.skeecaptain().applications() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Application store check failed: {}", e);
                (
                    HealthStatus::Degraded,
                    Some(format!("Application store unavailable: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "application_store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let ledger = app_state.ledger();

        ServiceStats {
            players_tracked: ledger.store().player_count().unwrap_or_default(),
            venues: ledger.venues(None).map(|v| v.len()).unwrap_or_default(),
            pending_applications: app_state
                .skeecaptain()
                .applications()
                .map(|applications| {
                    applications
                        .iter()
                        .filter(|a| a.status == crate::skeecaptain::ApplicationStatus::Pending)
                        .count()
                })
                .unwrap_or_default(),
            uptime_seconds: app_state.uptime().as_secs(),
        }
    }

    /// Convert health check to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_stopped_service_is_unhealthy() {
        let state = Arc::new(AppState::new(AppConfig::default()).unwrap());

        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(
            HealthCheck::readiness_check(state).await.unwrap(),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_running_service_is_healthy() {
        let state = Arc::new(AppState::new(AppConfig::default()).unwrap());
        state.start().await;

        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.checks.len(), 3);
        assert_eq!(state.metrics().service().health_status.get(), 2);
        assert!(health.to_json().unwrap().contains("session_store"));

        assert_eq!(
            HealthCheck::liveness_check(state).await.unwrap(),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_worst_status() {
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Unhealthy.worst(HealthStatus::Degraded),
            HealthStatus::Unhealthy
        );
    }
}
