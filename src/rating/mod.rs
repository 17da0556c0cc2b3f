//! ARM rating system
//!
//! This module provides the rating calculator interface, the ARM engine
//! and the profile views built on top of rated sessions.

pub mod arm;
pub mod calculator;
pub mod profile;

// Re-export commonly used types
pub use arm::ArmRatingCalculator;
pub use calculator::{RatingCalculator, RatingState, RatingUpdate};
pub use profile::{display_rating, PlayerProfile, RatingTier, TourCard, Trend};
