//! Error types for the skeeboard service
//!
//! Domain failures are raised as [`SkeeboardError`] and carried through
//! `anyhow` so the HTTP layer can downcast them into status codes.

use serde::{Deserialize, Serialize};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// A single rejected field in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Custom error types for specific skeeboard scenarios
#[derive(Debug, thiserror::Error)]
pub enum SkeeboardError {
    #[error("Validation failed: {}", summarize(.issues))]
    Validation { issues: Vec<FieldIssue> },

    #[error("Invalid rating input: {reason}")]
    InvalidInput { reason: String },

    #[error("Player not found: {player_name}")]
    PlayerNotFound { player_name: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl SkeeboardError {
    /// Build a validation error from a single field issue
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SkeeboardError::Validation {
            issues: vec![FieldIssue::new(field, reason)],
        }
    }

    /// Storage failure caused by a poisoned lock
    pub fn lock_poisoned(what: &str) -> Self {
        SkeeboardError::StorageFailure {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
