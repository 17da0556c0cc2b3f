//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! skeeboard service, including environment variable and TOML loading and
//! validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub leaderboard: LeaderboardSettings,
    pub ingestion: IngestionSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP server binds to
    pub http_host: String,
    /// Port for the HTTP API (health and metrics share it)
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Leaderboard query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Approved sessions a player needs before being ranked
    pub min_sessions: u32,
    /// Page size when the caller gives none
    pub default_limit: usize,
    /// Largest page a caller may request
    pub max_limit: usize,
}

/// Session ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Flag all-identical or all-maxed sessions for review
    pub flag_suspicious_sessions: bool,
    /// Most recent sessions included in a player profile
    pub profile_recent_sessions: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "skeeboard".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            min_sessions: 3,
            default_limit: 50,
            max_limit: 200,
        }
    }
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            flag_suspicious_sessions: true,
            profile_recent_sessions: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Rating settings
        if let Ok(seed) = env::var("SEED_RATING") {
            self.rating.seed_rating = seed
                .parse()
                .map_err(|_| anyhow!("Invalid SEED_RATING value: {}", seed))?;
        }
        if let Ok(sessions) = env::var("PROVISIONAL_SESSIONS") {
            self.rating.provisional_sessions = sessions
                .parse()
                .map_err(|_| anyhow!("Invalid PROVISIONAL_SESSIONS value: {}", sessions))?;
        }

        // Leaderboard settings
        if let Ok(min_sessions) = env::var("LEADERBOARD_MIN_SESSIONS") {
            self.leaderboard.min_sessions = min_sessions.parse().map_err(|_| {
                anyhow!("Invalid LEADERBOARD_MIN_SESSIONS value: {}", min_sessions)
            })?;
        }
        if let Ok(limit) = env::var("LEADERBOARD_DEFAULT_LIMIT") {
            self.leaderboard.default_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid LEADERBOARD_DEFAULT_LIMIT value: {}", limit))?;
        }
        if let Ok(limit) = env::var("LEADERBOARD_MAX_LIMIT") {
            self.leaderboard.max_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid LEADERBOARD_MAX_LIMIT value: {}", limit))?;
        }

        // Ingestion settings
        if let Ok(flag) = env::var("FLAG_SUSPICIOUS_SESSIONS") {
            self.ingestion.flag_suspicious_sessions = flag
                .parse()
                .map_err(|_| anyhow!("Invalid FLAG_SUSPICIOUS_SESSIONS value: {}", flag))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Socket address string for the HTTP server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.http_host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    config.rating.validate()?;

    if config.leaderboard.default_limit == 0 {
        return Err(anyhow!("Leaderboard default limit must be greater than 0"));
    }
    if config.leaderboard.max_limit < config.leaderboard.default_limit {
        return Err(anyhow!(
            "Leaderboard max limit ({}) is below the default limit ({})",
            config.leaderboard.max_limit,
            config.leaderboard.default_limit
        ));
    }

    if config.ingestion.profile_recent_sessions == 0 {
        return Err(anyhow!("Profile recent session count must be greater than 0"));
    }

    Ok(())
}
