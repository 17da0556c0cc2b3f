//! Common types used throughout the skeeboard service

use crate::error::{Result, SkeeboardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Players are keyed by their (trimmed) display name
pub type PlayerName = String;

/// Unique identifier for sessions
pub type SessionId = Uuid;

/// Unique identifier for venues
pub type VenueId = Uuid;

/// Number of games in one session
pub const GAMES_PER_SESSION: usize = 5;

/// Highest score a single game can record
pub const MAX_GAME_SCORE: u32 = 900;

/// Every game score is a multiple of this step
pub const SCORE_STEP: u32 = 10;

/// Five validated game scores.
///
/// The only way to build one is [`SessionScores::new`], which enforces the
/// count, range and step constraints. Anything holding a `SessionScores`
/// can rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionScores([u32; GAMES_PER_SESSION]);

impl SessionScores {
    /// Validate raw scores
    pub fn new(scores: &[u32]) -> Result<Self> {
        if scores.len() != GAMES_PER_SESSION {
            return Err(SkeeboardError::InvalidInput {
                reason: format!(
                    "expected {} scores, got {}",
                    GAMES_PER_SESSION,
                    scores.len()
                ),
            }
            .into());
        }

        for (index, score) in scores.iter().enumerate() {
            if *score > MAX_GAME_SCORE {
                return Err(SkeeboardError::InvalidInput {
                    reason: format!("score {} is {}, above {}", index + 1, score, MAX_GAME_SCORE),
                }
                .into());
            }
            if score % SCORE_STEP != 0 {
                return Err(SkeeboardError::InvalidInput {
                    reason: format!(
                        "score {} is {}, not a multiple of {}",
                        index + 1,
                        score,
                        SCORE_STEP
                    ),
                }
                .into());
            }
        }

        let mut games = [0; GAMES_PER_SESSION];
        games.copy_from_slice(scores);
        Ok(Self(games))
    }

    pub fn games(&self) -> &[u32; GAMES_PER_SESSION] {
        &self.0
    }

    /// Sum of the five games, in [0, 4500]
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl<'de> Deserialize<'de> for SessionScores {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<u32>::deserialize(deserializer)?;
        SessionScores::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Persisted state for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: PlayerName,
    pub current_rating: f64,
    /// Approved sessions only
    pub total_sessions: u32,
    pub is_provisional: bool,
    pub created_at: DateTime<Utc>,
    pub last_session_at: Option<DateTime<Utc>>,
}

impl PlayerRecord {
    /// Create a player that has not played yet
    pub fn new(name: impl Into<PlayerName>, seed_rating: f64) -> Self {
        Self {
            name: name.into(),
            current_rating: seed_rating,
            total_sessions: 0,
            is_provisional: true,
            created_at: crate::utils::current_timestamp(),
            last_session_at: None,
        }
    }

    /// Fold an approved session into the player's state
    pub fn apply_session(&mut self, session: &SessionRecord) {
        if !session.approved {
            return;
        }

        self.current_rating = session.rating_after;
        self.total_sessions += 1;
        self.is_provisional = session.is_provisional;
        self.last_session_at = Some(session.submitted_at);
    }
}

/// Immutable record of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub player_name: PlayerName,
    pub venue_name: String,
    pub venue_state: Option<String>,
    pub scores: SessionScores,
    pub session_total: u32,
    pub rating_before: f64,
    pub rating_after: f64,
    pub rating_delta: f64,
    /// Player's provisional status after this session
    pub is_provisional: bool,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub approved: bool,
}

/// A place with skeeball lanes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub city: String,
    pub state: String,
    pub verified: bool,
}

/// Which slice of players a leaderboard covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "filter", rename_all = "lowercase")]
pub enum LeaderboardScope {
    Global,
    State(String),
    Venue(String),
}

impl std::fmt::Display for LeaderboardScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaderboardScope::Global => write!(f, "global"),
            LeaderboardScope::State(state) => write!(f, "state:{}", state),
            LeaderboardScope::Venue(venue) => write!(f, "venue:{}", venue),
        }
    }
}

/// One ranked row of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_name: PlayerName,
    pub rating: f64,
    pub display_rating: String,
    pub title: String,
    pub sessions: u32,
    pub is_provisional: bool,
    pub venue_name: Option<String>,
}
