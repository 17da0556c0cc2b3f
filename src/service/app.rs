//! Main application state and service coordination
//!
//! This module contains the AppState that wires the ledger, leaderboard,
//! skeecaptain intake and metrics together and tracks whether the service
//! is accepting traffic.

use crate::config::AppConfig;
use crate::leaderboard::LeaderboardService;
use crate::ledger::{InMemorySessionStore, SessionLedger, SessionStore};
use crate::metrics::MetricsCollector;
use crate::rating::ArmRatingCalculator;
use crate::skeecaptain::{ApplicationStore, InMemoryApplicationStore, SkeecaptainService};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Session ingestion and player lookups
    ledger: Arc<SessionLedger>,

    /// Ranked views over the ledger
    leaderboard: Arc<LeaderboardService>,

    /// Skeecaptain application intake
    skeecaptain: Arc<SkeecaptainService>,

    /// Prometheus metrics
    metrics: Arc<MetricsCollector>,

    started_at: Instant,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with in-memory storage
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_stores(
            config,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryApplicationStore::new()),
        )
    }

    /// Initialize the application over the given stores
    pub fn with_stores(
        config: AppConfig,
        session_store: Arc<dyn SessionStore>,
        application_store: Arc<dyn ApplicationStore>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing skeeboard service");

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let calculator = Arc::new(ArmRatingCalculator::new(config.rating.clone()).map_err(
            |e| ServiceError::Initialization {
                message: format!("Failed to initialize rating calculator: {}", e),
            },
        )?);

        let ledger = Arc::new(
            SessionLedger::new(
                session_store.clone(),
                calculator,
                config.ingestion.clone(),
            )
            .with_metrics(metrics.clone()),
        );
        let leaderboard = Arc::new(LeaderboardService::new(
            session_store,
            config.leaderboard.clone(),
        ));
        let skeecaptain = Arc::new(
            SkeecaptainService::new(application_store).with_metrics(metrics.clone()),
        );

        info!(
            "Configuration: service={}, seed_rating={:.1}, provisional_sessions={}, leaderboard_min_sessions={}",
            config.service.name,
            config.rating.seed_rating,
            config.rating.provisional_sessions,
            config.leaderboard.min_sessions
        );

        Ok(Self {
            config,
            ledger,
            leaderboard,
            skeecaptain,
            metrics,
            started_at: Instant::now(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Mark the service as accepting traffic
    pub async fn start(&self) {
        *self.is_running.write().await = true;
        info!("Skeeboard service started");
    }

    /// Stop accepting traffic and log final statistics
    pub async fn shutdown(&self) {
        info!("Starting graceful shutdown of skeeboard service");

        *self.is_running.write().await = false;

        match self.ledger.store().player_count() {
            Ok(players) => info!(
                "Final service statistics: {} players, uptime {}s",
                players,
                self.uptime().as_secs()
            ),
            Err(e) => warn!("Failed to read final statistics: {}", e),
        }

        info!("Skeeboard service shutdown completed");
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn ledger(&self) -> Arc<SessionLedger> {
        self.ledger.clone()
    }

    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        self.leaderboard.clone()
    }

    pub fn skeecaptain(&self) -> Arc<SkeecaptainService> {
        self.skeecaptain.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
