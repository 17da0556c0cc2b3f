//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the skeeboard service using
//! Prometheus metrics. Every metric is registered on the collector's own
//! registry so tests can create as many collectors as they like.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the skeeboard service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Session and rating metrics
    session_metrics: SessionMetrics,

    /// Skeecaptain application metrics
    application_metrics: ApplicationMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Session and rating metrics
#[derive(Clone)]
pub struct SessionMetrics {
    /// Sessions submitted by outcome (approved, flagged, rejected)
    pub sessions_submitted_total: IntCounterVec,

    /// Validation failures by field
    pub validation_failures_total: IntCounterVec,

    /// Rating change per approved session
    pub rating_delta: Histogram,

    /// Ratings after each approved session
    pub rating_distribution: Histogram,

    /// Players leaving provisional status
    pub provisional_exits_total: IntCounter,

    /// Players known to the ledger
    pub players_tracked: IntGauge,
}

/// Skeecaptain application metrics
#[derive(Clone)]
pub struct ApplicationMetrics {
    /// Applications accepted for review
    pub applications_submitted_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// HTTP request duration by route and status
    pub request_duration: HistogramVec,

    /// Session ingestion time, validation to receipt
    pub ingestion_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let session_metrics = SessionMetrics::new(&registry)?;
        let application_metrics = ApplicationMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            session_metrics,
            application_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get session metrics
    pub fn sessions(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    /// Get application metrics
    pub fn applications(&self) -> &ApplicationMetrics {
        &self.application_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a submission outcome
    pub fn record_session_submitted(&self, outcome: &str) {
        self.session_metrics
            .sessions_submitted_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a rejected field. Indexed fields like `scores[2]` share one label.
    pub fn record_validation_failure(&self, field: &str) {
        let label = field.split('[').next().unwrap_or(field);
        self.session_metrics
            .validation_failures_total
            .with_label_values(&[label])
            .inc();
    }

    /// Record the rating movement of an approved session
    pub fn record_rating_change(&self, delta: f64, new_rating: f64) {
        self.session_metrics.rating_delta.observe(delta);
        self.session_metrics.rating_distribution.observe(new_rating);
    }

    /// Record a player establishing a rating
    pub fn record_provisional_exit(&self) {
        self.session_metrics.provisional_exits_total.inc();
    }

    /// Update the number of known players
    pub fn set_players_tracked(&self, count: usize) {
        self.session_metrics.players_tracked.set(count as i64);
    }

    /// Record an accepted skeecaptain application
    pub fn record_application_submitted(&self) {
        self.application_metrics.applications_submitted_total.inc();
    }

    /// Record a handled HTTP request
    pub fn record_request(&self, route: &str, status: u16, duration: Duration) {
        self.performance_metrics
            .request_duration
            .with_label_values(&[route, &status.to_string()])
            .observe(duration.as_secs_f64());
    }

    /// Record session ingestion duration
    pub fn record_ingestion(&self, duration: Duration) {
        self.performance_metrics
            .ingestion_duration
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Update service uptime
    pub fn set_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        TextEncoder::new()
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("skeeboard_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "skeeboard_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("skeeboard_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl SessionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let sessions_submitted_total = IntCounterVec::new(
            Opts::new(
                "skeeboard_sessions_submitted_total",
                "Sessions submitted by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(sessions_submitted_total.clone()))?;

        let validation_failures_total = IntCounterVec::new(
            Opts::new(
                "skeeboard_validation_failures_total",
                "Rejected submission fields",
            ),
            &["field"],
        )?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new("skeeboard_rating_delta", "Rating change per approved session")
                .buckets(vec![-4.0, -2.0, -1.0, -0.5, -0.1, 0.1, 0.5, 1.0, 2.0, 4.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "skeeboard_rating_distribution",
                "Player rating after each approved session",
            )
            .buckets(vec![9.0, 11.0, 14.0, 17.0, 20.0, 25.0]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        let provisional_exits_total = IntCounter::new(
            "skeeboard_provisional_exits_total",
            "Players that established a rating",
        )?;
        registry.register(Box::new(provisional_exits_total.clone()))?;

        let players_tracked =
            IntGauge::new("skeeboard_players_tracked", "Players known to the ledger")?;
        registry.register(Box::new(players_tracked.clone()))?;

        Ok(Self {
            sessions_submitted_total,
            validation_failures_total,
            rating_delta,
            rating_distribution,
            provisional_exits_total,
            players_tracked,
        })
    }
}

impl ApplicationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let applications_submitted_total = IntCounter::new(
            "skeeboard_applications_submitted_total",
            "Skeecaptain applications submitted",
        )?;
        registry.register(Box::new(applications_submitted_total.clone()))?;

        Ok(Self {
            applications_submitted_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "skeeboard_request_duration_seconds",
                "HTTP request duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["route", "status"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let ingestion_duration = Histogram::with_opts(
            HistogramOpts::new(
                "skeeboard_ingestion_duration_seconds",
                "Session ingestion time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(ingestion_duration.clone()))?;

        Ok(Self {
            request_duration,
            ingestion_duration,
        })
    }
}
