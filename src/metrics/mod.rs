//! Metrics and monitoring for the skeeboard service
//!
//! Counters, gauges and histograms for session ingestion, ratings,
//! applications and HTTP handling, gathered on one Prometheus registry and
//! served on `/metrics`.

pub mod collector;

pub use collector::{
    ApplicationMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, ServiceMetrics,
    SessionMetrics,
};
