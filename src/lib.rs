//! Skeeboard - skeeball session ledger and ARM rating service
//!
//! This crate records five-game skeeball sessions, keeps each player's ARM
//! rating current, ranks players on global, state and venue leaderboards and
//! serves all of it over an axum HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod skeecaptain;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, SkeeboardError};
pub use types::*;

// Re-export key components
pub use leaderboard::LeaderboardService;
pub use ledger::{InMemorySessionStore, SessionLedger, SessionStore};
pub use rating::{ArmRatingCalculator, RatingCalculator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
