//! Service layer for the skeeboard service
//!
//! This module contains the main application state, health checks and
//! service lifecycle.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
