//! Rating calculator trait and result types
//!
//! This module defines the interface session ingestion uses to rate a
//! submitted session. The ARM implementation lives in [`crate::rating::arm`].

use crate::error::Result;
use crate::types::SessionScores;
use serde::{Deserialize, Serialize};

/// A player's rating state before a session is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingState {
    pub rating: f64,
    /// Approved sessions recorded so far
    pub session_count: u32,
}

/// Result of rating one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    /// Prior rating after clamping and rounding
    pub rating_before: f64,
    pub new_rating: f64,
    pub delta: f64,
    pub session_total: u32,
    /// Whether the player is still provisional after this session
    pub is_provisional: bool,
    /// True when this session ended the provisional period
    pub established: bool,
}

/// Trait for rating submitted sessions
#[cfg_attr(test, mockall::automock)]
pub trait RatingCalculator: Send + Sync {
    /// Rating assigned to a player with no sessions
    fn seed_rating(&self) -> f64;

    /// Approved sessions needed before a rating is established
    fn provisional_sessions(&self) -> u32;

    /// Rate one session.
    ///
    /// # Arguments
    /// * `prior` - the player's state before this session
    /// * `scores` - the validated scores of this session
    /// * `prior_totals` - totals of the player's earlier approved sessions,
    ///   oldest first
    fn rate_session(
        &self,
        prior: &RatingState,
        scores: &SessionScores,
        prior_totals: &[u32],
    ) -> Result<RatingUpdate>;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
