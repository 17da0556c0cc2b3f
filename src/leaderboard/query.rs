//! Scoped, paginated leaderboard queries

use crate::config::LeaderboardSettings;
use crate::error::{Result, SkeeboardError};
use crate::leaderboard::ranking::{rank_players, RankedPlayer};
use crate::ledger::SessionStore;
use crate::rating::{display_rating, RatingTier};
use crate::types::{LeaderboardEntry, LeaderboardScope, PlayerRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Query-string parameters of a leaderboard request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub filter: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One page of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    #[serde(flatten)]
    pub scope: LeaderboardScope,
    /// Ranked players in the whole scope, not just this page
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Turn a `/leaderboard/{scope}` path segment and filter into a scope
pub fn parse_scope(kind: &str, filter: Option<&str>) -> Result<LeaderboardScope> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());

    match (kind.trim().to_ascii_lowercase().as_str(), filter) {
        ("global", _) => Ok(LeaderboardScope::Global),
        ("state", Some(state)) => Ok(LeaderboardScope::State(state.to_string())),
        ("venue", Some(venue)) => Ok(LeaderboardScope::Venue(venue.to_string())),
        ("state" | "venue", None) => Err(SkeeboardError::invalid_field(
            "filter",
            format!("is required for the {} leaderboard", kind.trim()),
        )
        .into()),
        _ => Err(SkeeboardError::invalid_field(
            "scope",
            "must be one of global, state, venue",
        )
        .into()),
    }
}

/// Leaderboard service over the session store
pub struct LeaderboardService {
    store: Arc<dyn SessionStore>,
    settings: LeaderboardSettings,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn SessionStore>, settings: LeaderboardSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &LeaderboardSettings {
        &self.settings
    }

    /// Rank the players in `scope` and return one page
    pub fn leaderboard(
        &self,
        scope: &LeaderboardScope,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<LeaderboardPage> {
        let limit = limit
            .unwrap_or(self.settings.default_limit)
            .clamp(1, self.settings.max_limit);
        let offset = offset.unwrap_or(0);

        let players = self.players_in_scope(scope)?;
        let ranked = rank_players(&players, self.settings.min_sessions);
        let total = ranked.len();

        let entries = ranked
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|ranked| self.entry(ranked))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Leaderboard {} - {} ranked, returning {} from offset {}",
            scope,
            total,
            entries.len(),
            offset
        );

        Ok(LeaderboardPage {
            scope: scope.clone(),
            total,
            limit,
            offset,
            entries,
        })
    }

    fn players_in_scope(&self, scope: &LeaderboardScope) -> Result<Vec<PlayerRecord>> {
        let sessions = match scope {
            LeaderboardScope::Global => return self.store.get_players(),
            LeaderboardScope::State(state) => self.store.sessions_in_state(state)?,
            LeaderboardScope::Venue(venue) => self.store.sessions_at_venue(venue)?,
        };

        let names: HashSet<&str> = sessions
            .iter()
            .filter(|session| session.approved)
            .map(|session| session.player_name.as_str())
            .collect();

        let mut players = Vec::with_capacity(names.len());
        for name in names {
            if let Some(player) = self.store.get_player(name)? {
                players.push(player);
            }
        }
        Ok(players)
    }

    fn entry(&self, ranked: RankedPlayer) -> Result<LeaderboardEntry> {
        let RankedPlayer { rank, player } = ranked;
        let venue_name = self.store.latest_venue_for_player(&player.name)?;

        Ok(LeaderboardEntry {
            rank,
            display_rating: display_rating(player.current_rating, player.is_provisional),
            title: RatingTier::from_rating(player.current_rating)
                .title()
                .to_string(),
            rating: player.current_rating,
            sessions: player.total_sessions,
            is_provisional: player.is_provisional,
            venue_name,
            player_name: player.name,
        })
    }
}
