//! Leaderboards
//!
//! Pure ranking of players plus the scoped, paginated query service used
//! by the HTTP API.

pub mod query;
pub mod ranking;

pub use query::{parse_scope, LeaderboardPage, LeaderboardQuery, LeaderboardService};
pub use ranking::{compare_players, rank_players, RankedPlayer};
