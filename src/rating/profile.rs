//! Player profile views derived from the session history
//!
//! Streaks, trends, tier titles and the provisional display marker. None of
//! this feeds back into the rating itself.

use crate::types::{PlayerName, PlayerRecord, SessionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Suffix marking a provisional rating in displays
pub const PROVISIONAL_MARKER: &str = "p";

/// Sessions considered when computing the trend
const TREND_WINDOW: usize = 5;

/// Rating movement that counts as a trend
const TREND_THRESHOLD: f64 = 0.5;

/// Skill tier derived from the rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Master,
    Elite,
}

impl RatingTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 20.0 {
            RatingTier::Elite
        } else if rating >= 17.0 {
            RatingTier::Master
        } else if rating >= 14.0 {
            RatingTier::Expert
        } else if rating >= 11.0 {
            RatingTier::Advanced
        } else if rating >= 9.0 {
            RatingTier::Intermediate
        } else {
            RatingTier::Beginner
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RatingTier::Elite => "ELITE ROLLER",
            RatingTier::Master => "MASTER ROLLER",
            RatingTier::Expert => "EXPERT ROLLER",
            RatingTier::Advanced => "ADVANCED ROLLER",
            RatingTier::Intermediate => "INTERMEDIATE ROLLER",
            RatingTier::Beginner => "BEGINNER ROLLER",
        }
    }
}

/// Direction of recent rating movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
            Trend::Stable => write!(f, "STABLE"),
        }
    }
}

/// Format a rating with one decimal, marking provisional ratings
pub fn display_rating(rating: f64, is_provisional: bool) -> String {
    if is_provisional {
        format!("{:.1}{}", rating, PROVISIONAL_MARKER)
    } else {
        format!("{:.1}", rating)
    }
}

fn approved_chronological(sessions: &[SessionRecord]) -> Vec<&SessionRecord> {
    let mut approved: Vec<&SessionRecord> = sessions.iter().filter(|s| s.approved).collect();
    approved.sort_by_key(|s| s.submitted_at);
    approved
}

/// Consecutive rating gains counting back from the newest approved session
pub fn hot_streak(sessions: &[SessionRecord]) -> u32 {
    let approved = approved_chronological(sessions);

    approved
        .windows(2)
        .rev()
        .take_while(|pair| pair[1].rating_after > pair[0].rating_after)
        .count() as u32
}

/// Trend across the last few approved sessions
pub fn trend(sessions: &[SessionRecord]) -> Trend {
    let approved = approved_chronological(sessions);
    if approved.len() < 3 {
        return Trend::Stable;
    }

    let window = &approved[approved.len().saturating_sub(TREND_WINDOW)..];
    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (first.rating_after, last.rating_after),
        _ => return Trend::Stable,
    };

    let diff = last - first;
    if diff > TREND_THRESHOLD {
        Trend::Up
    } else if diff < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Full player profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub player_name: PlayerName,
    pub current_rating: f64,
    pub display_rating: String,
    pub title: String,
    pub tier: RatingTier,
    pub total_sessions: u32,
    pub is_provisional: bool,
    pub best_rating: f64,
    pub average_session_total: Option<f64>,
    pub venues_played: usize,
    pub hot_streak: u32,
    pub trend: Trend,
    /// Newest first, flagged sessions included
    pub recent_sessions: Vec<SessionRecord>,
}

impl PlayerProfile {
    /// Build a profile from a player and their full session history
    pub fn build(player: &PlayerRecord, sessions: &[SessionRecord], recent_limit: usize) -> Self {
        let approved = approved_chronological(sessions);

        let best_rating = approved
            .iter()
            .map(|s| s.rating_after)
            .fold(player.current_rating, f64::max);

        let average_session_total = if approved.is_empty() {
            None
        } else {
            let sum: u64 = approved.iter().map(|s| s.session_total as u64).sum();
            Some(sum as f64 / approved.len() as f64)
        };

        let venues_played = approved
            .iter()
            .map(|s| crate::utils::lookup_key(&s.venue_name))
            .collect::<HashSet<_>>()
            .len();

        // Reversed first so equal timestamps keep the later insert on top
        let mut recent_sessions: Vec<SessionRecord> = sessions.iter().rev().cloned().collect();
        recent_sessions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        recent_sessions.truncate(recent_limit);

        let tier = RatingTier::from_rating(player.current_rating);

        Self {
            player_name: player.name.clone(),
            current_rating: player.current_rating,
            display_rating: display_rating(player.current_rating, player.is_provisional),
            title: tier.title().to_string(),
            tier,
            total_sessions: player.total_sessions,
            is_provisional: player.is_provisional,
            best_rating,
            average_session_total,
            venues_played,
            hot_streak: hot_streak(sessions),
            trend: trend(sessions),
            recent_sessions,
        }
    }
}

/// Shareable summary card for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourCard {
    pub player_name: PlayerName,
    pub rating: String,
    pub title: String,
    pub sessions: u32,
    pub trend: String,
    pub hot_streak: u32,
    pub venues: usize,
}

impl From<&PlayerProfile> for TourCard {
    fn from(profile: &PlayerProfile) -> Self {
        Self {
            player_name: profile.player_name.clone(),
            rating: profile.display_rating.clone(),
            title: profile.title.clone(),
            sessions: profile.total_sessions,
            trend: profile.trend.to_string(),
            hot_streak: profile.hot_streak,
            venues: profile.venues_played,
        }
    }
}
