//! ARM rating configuration
//!
//! Every constant of the rating formula lives here so that the update,
//! the provisional exit and any display logic read the same numbers.

use crate::error::{Result, SkeeboardError};
use serde::{Deserialize, Serialize};

/// K-factor applied once a player has at least `min_sessions` prior sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFactorTier {
    pub min_sessions: u32,
    pub k_factor: f64,
}

/// Rating system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Lowest possible rating
    pub min_rating: f64,
    /// Highest possible rating
    pub max_rating: f64,
    /// Rating given to a player before their first session
    pub seed_rating: f64,
    /// Expected session total at `min_rating`
    pub expected_total_at_min: f64,
    /// Expected session total at `max_rating`
    pub expected_total_at_max: f64,
    /// Divisor turning a total-vs-expected gap into rating points
    pub performance_scale: f64,
    /// Approved sessions needed to leave the provisional period
    pub provisional_sessions: u32,
    /// Average total that maps to `min_rating` when establishing a rating
    pub initial_base_total: f64,
    /// Session-total points per rating point when establishing a rating
    pub initial_points_per_rating: f64,
    /// Ordered by `min_sessions`, first tier must start at 0
    pub k_factor_tiers: Vec<KFactorTier>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            min_rating: 7.0,
            max_rating: 25.0,
            seed_rating: 10.0,
            expected_total_at_min: 150.0,
            expected_total_at_max: 700.0,
            performance_scale: 100.0,
            provisional_sessions: 3,
            initial_base_total: 150.0,
            initial_points_per_rating: 25.0,
            k_factor_tiers: vec![
                KFactorTier {
                    min_sessions: 0,
                    k_factor: 0.20,
                },
                KFactorTier {
                    min_sessions: 10,
                    k_factor: 0.15,
                },
                KFactorTier {
                    min_sessions: 25,
                    k_factor: 0.10,
                },
                KFactorTier {
                    min_sessions: 50,
                    k_factor: 0.08,
                },
            ],
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.min_rating < self.max_rating) {
            return Err(config_error("min_rating must be below max_rating"));
        }

        if self.seed_rating < self.min_rating || self.seed_rating > self.max_rating {
            return Err(config_error("seed_rating must lie within the rating range"));
        }

        if !(self.expected_total_at_min < self.expected_total_at_max) {
            return Err(config_error(
                "expected_total_at_min must be below expected_total_at_max",
            ));
        }

        if self.performance_scale <= 0.0 {
            return Err(config_error("performance_scale must be positive"));
        }

        if self.initial_points_per_rating <= 0.0 {
            return Err(config_error("initial_points_per_rating must be positive"));
        }

        if self.provisional_sessions == 0 {
            return Err(config_error("provisional_sessions must be at least 1"));
        }

        match self.k_factor_tiers.first() {
            Some(tier) if tier.min_sessions == 0 => {}
            _ => return Err(config_error("k_factor_tiers must start at 0 sessions")),
        }

        for tier in &self.k_factor_tiers {
            if tier.k_factor <= 0.0 {
                return Err(config_error("every k_factor must be positive"));
            }
        }

        // Volatility may only shrink as experience grows
        for pair in self.k_factor_tiers.windows(2) {
            if pair[1].min_sessions <= pair[0].min_sessions {
                return Err(config_error(
                    "k_factor_tiers must be ordered by increasing min_sessions",
                ));
            }
            if pair[1].k_factor > pair[0].k_factor {
                return Err(config_error("k_factor must not increase with sessions"));
            }
        }

        Ok(())
    }
}

fn config_error(message: &str) -> anyhow::Error {
    SkeeboardError::ConfigurationError {
        message: message.to_string(),
    }
    .into()
}
