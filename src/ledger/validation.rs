//! Request validation for session submissions and venue registrations
//!
//! Raw request bodies deserialize leniently so every bad field can be
//! reported at once; validation turns them into typed values or a
//! [`SkeeboardError::Validation`] listing all issues.

use crate::error::{FieldIssue, Result, SkeeboardError};
use crate::types::{SessionScores, GAMES_PER_SESSION, MAX_GAME_SCORE, SCORE_STEP};
use serde::{Deserialize, Serialize};

pub const MAX_PLAYER_NAME_LEN: usize = 100;
pub const MAX_VENUE_NAME_LEN: usize = 200;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_STATE_LEN: usize = 10;
pub const MAX_NOTES_LEN: usize = 1000;

/// Session submission as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSubmission {
    pub player_name: String,
    pub venue_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub scores: Vec<i64>,
    pub notes: Option<String>,
}

/// Venue details attached to a validated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueDetails {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub player_name: String,
    pub venue: VenueDetails,
    pub scores: SessionScores,
    pub notes: Option<String>,
}

/// Venue registration body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VenueRegistration {
    pub name: String,
    pub city: String,
    pub state: String,
}

/// Why a session was held back from rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionReason {
    AllMaxScores,
    IdenticalScores,
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspicionReason::AllMaxScores => write!(f, "every game at {}", MAX_GAME_SCORE),
            SuspicionReason::IdenticalScores => write!(f, "all games scored the same"),
        }
    }
}

/// Flag score patterns that are unlikely from a real session
pub fn suspicion(scores: &SessionScores) -> Option<SuspicionReason> {
    let games = scores.games();

    if games.iter().all(|score| *score == MAX_GAME_SCORE) {
        Some(SuspicionReason::AllMaxScores)
    } else if games.windows(2).all(|pair| pair[0] == pair[1]) {
        Some(SuspicionReason::IdenticalScores)
    } else {
        None
    }
}

/// Collects field issues while a request is checked
#[derive(Debug, Default)]
pub(crate) struct IssueCollector {
    issues: Vec<FieldIssue>,
}

impl IssueCollector {
    pub(crate) fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.issues.push(FieldIssue::new(field, reason));
    }

    /// Trimmed required text between 1 and `max` characters
    pub(crate) fn required(&mut self, field: &str, value: &str, max: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "is required");
        } else if trimmed.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
        trimmed.to_string()
    }

    /// Trimmed optional text; blank counts as absent
    pub(crate) fn optional(&mut self, field: &str, value: Option<&str>, max: usize) -> Option<String> {
        let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
        if trimmed.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
        Some(trimmed.to_string())
    }

    /// Trimmed text of at least `min` characters
    pub(crate) fn at_least(&mut self, field: &str, value: &str, min: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "is required");
        } else if trimmed.chars().count() < min {
            self.push(field, format!("must be at least {} characters", min));
        }
        trimmed.to_string()
    }

    pub(crate) fn into_error(self) -> Option<SkeeboardError> {
        if self.issues.is_empty() {
            None
        } else {
            Some(SkeeboardError::Validation {
                issues: self.issues,
            })
        }
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T> {
        match self.into_error() {
            Some(error) => Err(error.into()),
            None => Ok(value),
        }
    }
}

fn check_scores(issues: &mut IssueCollector, raw: &[i64]) -> Vec<u32> {
    if raw.len() != GAMES_PER_SESSION {
        issues.push(
            "scores",
            format!(
                "must contain exactly {} scores, got {}",
                GAMES_PER_SESSION,
                raw.len()
            ),
        );
        return Vec::new();
    }

    let mut games = Vec::with_capacity(GAMES_PER_SESSION);
    for (index, score) in raw.iter().enumerate() {
        let field = format!("scores[{}]", index);
        if *score < 0 || *score > MAX_GAME_SCORE as i64 {
            issues.push(field, format!("must be between 0 and {}", MAX_GAME_SCORE));
        } else if score % SCORE_STEP as i64 != 0 {
            issues.push(field, format!("must be a multiple of {}", SCORE_STEP));
        } else {
            games.push(*score as u32);
        }
    }
    games
}

impl SessionSubmission {
    /// Check every field, reporting all problems together
    pub fn validate(&self) -> Result<ValidSubmission> {
        let mut issues = IssueCollector::default();

        let player_name = issues.required("playerName", &self.player_name, MAX_PLAYER_NAME_LEN);
        let venue_name = issues.required("venueName", &self.venue_name, MAX_VENUE_NAME_LEN);
        let city = issues.optional("city", self.city.as_deref(), MAX_CITY_LEN);
        let state = issues
            .optional("state", self.state.as_deref(), MAX_STATE_LEN)
            .map(|state| state.to_ascii_uppercase());
        let notes = issues.optional("notes", self.notes.as_deref(), MAX_NOTES_LEN);
        let games = check_scores(&mut issues, &self.scores);

        if let Some(error) = issues.into_error() {
            return Err(error.into());
        }

        let scores = SessionScores::new(&games)?;

        Ok(ValidSubmission {
            player_name,
            venue: VenueDetails {
                name: venue_name,
                city,
                state,
            },
            scores,
            notes,
        })
    }
}

impl VenueRegistration {
    /// Check the registration, returning trimmed values
    pub fn validate(&self) -> Result<VenueDetails> {
        let mut issues = IssueCollector::default();

        let name = issues.required("name", &self.name, MAX_VENUE_NAME_LEN);
        let city = issues.required("city", &self.city, MAX_CITY_LEN);
        let state = issues.required("state", &self.state, MAX_STATE_LEN);

        issues.finish(VenueDetails {
            name,
            city: Some(city),
            state: Some(state.to_ascii_uppercase()),
        })
    }
}
