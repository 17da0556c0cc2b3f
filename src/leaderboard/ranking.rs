//! Leaderboard ordering
//!
//! Players are ordered by rating, then approved session count, then name.
//! Ranks are strictly sequential; equal players still get distinct ranks.

use crate::types::PlayerRecord;
use std::cmp::Ordering;

/// A player with its absolute leaderboard position
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlayer {
    pub rank: usize,
    pub player: PlayerRecord,
}

/// Leaderboard order: rating desc, sessions desc, name asc
pub fn compare_players(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    b.current_rating
        .total_cmp(&a.current_rating)
        .then_with(|| b.total_sessions.cmp(&a.total_sessions))
        .then_with(|| a.name.cmp(&b.name))
}

/// Rank every player with at least `min_sessions` approved sessions
pub fn rank_players(players: &[PlayerRecord], min_sessions: u32) -> Vec<RankedPlayer> {
    let mut eligible: Vec<&PlayerRecord> = players
        .iter()
        .filter(|player| player.total_sessions >= min_sessions)
        .collect();

    eligible.sort_by(|a, b| compare_players(a, b));

    eligible
        .into_iter()
        .enumerate()
        .map(|(index, player)| RankedPlayer {
            rank: index + 1,
            player: player.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, rating: f64, sessions: u32) -> PlayerRecord {
        let mut player = PlayerRecord::new(name, 10.0);
        player.current_rating = rating;
        player.total_sessions = sessions;
        player.is_provisional = sessions < 3;
        player
    }

    fn names(ranked: &[RankedPlayer]) -> Vec<&str> {
        ranked.iter().map(|r| r.player.name.as_str()).collect()
    }

    #[test]
    fn test_orders_by_rating() {
        let ranked = rank_players(
            &[
                player("Low", 9.0, 5),
                player("High", 18.0, 5),
                player("Mid", 12.5, 5),
            ],
            3,
        );

        assert_eq!(names(&ranked), vec!["High", "Mid", "Low"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_ties_broken_by_sessions_then_name() {
        let ranked = rank_players(
            &[
                player("Zed", 15.2, 10),
                player("Amy", 15.2, 10),
                player("Veteran", 15.2, 40),
            ],
            3,
        );

        assert_eq!(names(&ranked), vec!["Veteran", "Amy", "Zed"]);
        // No shared ranks
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_players_below_threshold_excluded() {
        let ranked = rank_players(
            &[player("Newbie", 20.0, 2), player("Regular", 11.0, 3)],
            3,
        );

        assert_eq!(names(&ranked), vec!["Regular"]);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_players(&[], 3).is_empty());
        assert!(rank_players(&[player("Newbie", 20.0, 0)], 1).is_empty());
    }
}
