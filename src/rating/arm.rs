//! ARM (Alley Roller Metric) rating engine
//!
//! A session total is compared with the total expected for the player's
//! current rating; the gap is scaled into rating points, weighted by an
//! experience-dependent K-factor and clamped to the rating range. New
//! players are provisional until their rating is established from the
//! average of their first sessions.

use crate::config::RatingConfig;
use crate::error::{Result, SkeeboardError};
use crate::rating::calculator::{RatingCalculator, RatingState, RatingUpdate};
use crate::types::SessionScores;
use crate::utils::round_to_tenth;
use tracing::debug;

/// ARM rating calculator
#[derive(Debug, Clone)]
pub struct ArmRatingCalculator {
    config: RatingConfig,
}

impl ArmRatingCalculator {
    /// Create a new ARM calculator
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn rating_config(&self) -> &RatingConfig {
        &self.config
    }

    /// Clamp to the rating range and round to one decimal
    pub fn normalize(&self, rating: f64) -> f64 {
        round_to_tenth(rating.clamp(self.config.min_rating, self.config.max_rating))
    }

    /// Session total expected from a player at `rating`.
    ///
    /// Linear from `expected_total_at_min` at the lowest rating to
    /// `expected_total_at_max` at the highest.
    pub fn expected_score(&self, rating: f64) -> f64 {
        let span = self.config.max_rating - self.config.min_rating;
        let position = (rating - self.config.min_rating) / span;

        position * (self.config.expected_total_at_max - self.config.expected_total_at_min)
            + self.config.expected_total_at_min
    }

    /// K-factor for a player with `session_count` prior sessions
    pub fn k_factor(&self, session_count: u32) -> f64 {
        self.config
            .k_factor_tiers
            .iter()
            .take_while(|tier| tier.min_sessions <= session_count)
            .last()
            .map(|tier| tier.k_factor)
            .unwrap_or(self.config.k_factor_tiers[0].k_factor)
    }

    /// Incremental update of `current_rating` after one session
    pub fn update(
        &self,
        current_rating: f64,
        scores: &SessionScores,
        session_count: u32,
    ) -> Result<RatingUpdate> {
        let rating_before = self.checked_rating(current_rating)?;
        let session_total = scores.total();

        let expected = self.expected_score(rating_before);
        let performance_delta = (session_total as f64 - expected) / self.config.performance_scale;
        let k_factor = self.k_factor(session_count);

        let new_rating = self.normalize(rating_before + performance_delta * k_factor);

        debug!(
            "ARM update: rating={:.1}, total={}, expected={:.1}, k={:.2}, new={:.1}",
            rating_before, session_total, expected, k_factor, new_rating
        );

        Ok(RatingUpdate {
            rating_before,
            new_rating,
            delta: round_to_tenth(new_rating - rating_before),
            session_total,
            is_provisional: session_count + 1 < self.config.provisional_sessions,
            established: false,
        })
    }

    /// Rating established from the totals of a player's first sessions
    pub fn initial_rating(&self, totals: &[u32]) -> Result<f64> {
        if totals.is_empty() {
            return Err(SkeeboardError::InvalidInput {
                reason: "At least one session total is needed to establish a rating".to_string(),
            }
            .into());
        }

        let average = totals.iter().map(|total| *total as f64).sum::<f64>() / totals.len() as f64;
        let rating = self.config.min_rating
            + (average - self.config.initial_base_total) / self.config.initial_points_per_rating;

        Ok(self.normalize(rating))
    }

    fn checked_rating(&self, rating: f64) -> Result<f64> {
        if !rating.is_finite() {
            return Err(SkeeboardError::InvalidInput {
                reason: format!("Current rating {} is not a finite number", rating),
            }
            .into());
        }

        Ok(self.normalize(rating))
    }
}

impl Default for ArmRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for ArmRatingCalculator {
    fn seed_rating(&self) -> f64 {
        self.config.seed_rating
    }

    fn provisional_sessions(&self) -> u32 {
        self.config.provisional_sessions
    }

    fn rate_session(
        &self,
        prior: &RatingState,
        scores: &SessionScores,
        prior_totals: &[u32],
    ) -> Result<RatingUpdate> {
        let threshold = self.config.provisional_sessions;
        let sessions_after = prior.session_count + 1;

        if sessions_after != threshold {
            return self.update(prior.rating, scores, prior.session_count);
        }

        let needed = (threshold - 1) as usize;
        if prior_totals.len() < needed {
            return Err(SkeeboardError::InvalidInput {
                reason: format!(
                    "Establishing a rating needs {} earlier session totals, got {}",
                    needed,
                    prior_totals.len()
                ),
            }
            .into());
        }

        let rating_before = self.checked_rating(prior.rating)?;
        let mut totals: Vec<u32> = prior_totals[..needed].to_vec();
        totals.push(scores.total());

        let new_rating = self.initial_rating(&totals)?;

        debug!(
            "ARM rating established from totals {:?}: {:.1}",
            totals, new_rating
        );

        Ok(RatingUpdate {
            rating_before,
            new_rating,
            delta: round_to_tenth(new_rating - rating_before),
            session_total: scores.total(),
            is_provisional: false,
            established: true,
        })
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "arm",
            "min_rating": self.config.min_rating,
            "max_rating": self.config.max_rating,
            "seed_rating": self.config.seed_rating,
            "provisional_sessions": self.config.provisional_sessions,
            "k_factor_tiers": self.config.k_factor_tiers,
        })
    }
}
