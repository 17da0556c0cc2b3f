//! Session storage interface and the in-memory implementation
//!
//! Players, sessions and venues sit behind one [`SessionStore`] trait. The
//! per-player read-compute-write of a submission happens inside a single
//! [`SessionStore::record_session`] call so concurrent submissions for the
//! same player cannot lose an update.

use crate::error::{Result, SkeeboardError};
use crate::types::{PlayerRecord, SessionId, SessionRecord, Venue};
use crate::utils::{lookup_key, names_match};
use std::collections::HashMap;
use std::sync::RwLock;

/// What a session builder hands back to the store
#[derive(Debug, Clone)]
pub struct PendingSession {
    /// Player state before the session (freshly seeded for new players)
    pub player: PlayerRecord,
    pub session: SessionRecord,
    /// Venue to register together with the session
    pub venue: Option<Venue>,
}

/// Builds the next session from the player's current state and history.
///
/// Receives `None` for a player the store has never seen and `None` for a
/// venue that is not registered yet. History is in submission order,
/// flagged sessions included.
pub type SessionBuilder<'a> = dyn FnMut(
        Option<&PlayerRecord>,
        &[SessionRecord],
        Option<&Venue>,
    ) -> Result<PendingSession>
    + 'a;

/// Trait for ledger storage operations
pub trait SessionStore: Send + Sync {
    /// Get a player by name
    fn get_player(&self, player_name: &str) -> Result<Option<PlayerRecord>>;

    /// Get every known player
    fn get_players(&self) -> Result<Vec<PlayerRecord>>;

    /// Get total number of players
    fn player_count(&self) -> Result<usize>;

    /// Atomically build and append a session, folding it into the player
    /// and registering its venue if the builder asks for it.
    ///
    /// Nothing is written when the builder fails. Returns the player after
    /// the session together with the stored session.
    fn record_session(
        &self,
        player_name: &str,
        venue_name: &str,
        build: &mut SessionBuilder<'_>,
    ) -> Result<(PlayerRecord, SessionRecord)>;

    /// Get a single session
    fn get_session(&self, session_id: &SessionId) -> Result<Option<SessionRecord>>;

    /// All sessions for a player, oldest first
    fn sessions_for_player(&self, player_name: &str) -> Result<Vec<SessionRecord>>;

    /// Venue of the player's most recent approved session
    fn latest_venue_for_player(&self, player_name: &str) -> Result<Option<String>>;

    /// All sessions at a venue (case-insensitive name match), oldest first
    fn sessions_at_venue(&self, venue_name: &str) -> Result<Vec<SessionRecord>>;

    /// All sessions at venues in a state (case-insensitive), oldest first
    fn sessions_in_state(&self, state: &str) -> Result<Vec<SessionRecord>>;

    /// Register a venue, returning the existing one if the name is taken
    fn upsert_venue(&self, venue: Venue) -> Result<Venue>;

    /// List venues sorted by name, optionally restricted to one state
    fn list_venues(&self, state: Option<&str>) -> Result<Vec<Venue>>;
}

#[derive(Debug, Default)]
struct LedgerTables {
    players: HashMap<String, PlayerRecord>,
    sessions: Vec<SessionRecord>,
    sessions_by_player: HashMap<String, Vec<usize>>,
    sessions_by_id: HashMap<SessionId, usize>,
    venues: HashMap<String, Venue>,
}

impl LedgerTables {
    fn player_history(&self, player_name: &str) -> Vec<SessionRecord> {
        self.sessions_by_player
            .get(player_name)
            .map(|indexes| indexes.iter().map(|i| self.sessions[*i].clone()).collect())
            .unwrap_or_default()
    }
}

/// In-memory session storage implementation
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    tables: RwLock<LedgerTables>,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerTables>> {
        self.tables
            .read()
            .map_err(|_| SkeeboardError::lock_poisoned("ledger read").into())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerTables>> {
        self.tables
            .write()
            .map_err(|_| SkeeboardError::lock_poisoned("ledger write").into())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_player(&self, player_name: &str) -> Result<Option<PlayerRecord>> {
        let tables = self.read()?;
        Ok(tables.players.get(player_name).cloned())
    }

    fn get_players(&self) -> Result<Vec<PlayerRecord>> {
        let tables = self.read()?;
        Ok(tables.players.values().cloned().collect())
    }

    fn player_count(&self) -> Result<usize> {
        let tables = self.read()?;
        Ok(tables.players.len())
    }

    fn record_session(
        &self,
        player_name: &str,
        venue_name: &str,
        build: &mut SessionBuilder<'_>,
    ) -> Result<(PlayerRecord, SessionRecord)> {
        // Held for the whole read-compute-write
        let mut tables = self.write()?;

        let history = tables.player_history(player_name);
        let venue_key = lookup_key(venue_name);
        let PendingSession {
            mut player,
            session,
            venue,
        } = build(
            tables.players.get(player_name),
            &history,
            tables.venues.get(&venue_key),
        )?;

        if player.name != player_name || session.player_name != player_name {
            return Err(SkeeboardError::InternalError {
                message: format!(
                    "Session builder returned records for '{}' while recording '{}'",
                    session.player_name, player_name
                ),
            }
            .into());
        }

        if let Some(venue) = venue {
            if lookup_key(&venue.name) != venue_key {
                return Err(SkeeboardError::InternalError {
                    message: format!(
                        "Session builder registered venue '{}' while recording at '{}'",
                        venue.name, venue_name
                    ),
                }
                .into());
            }
            tables.venues.entry(venue_key).or_insert(venue);
        }

        player.apply_session(&session);

        let index = tables.sessions.len();
        tables.sessions_by_id.insert(session.id, index);
        tables
            .sessions_by_player
            .entry(player_name.to_string())
            .or_default()
            .push(index);
        tables.sessions.push(session.clone());
        tables
            .players
            .insert(player_name.to_string(), player.clone());

        Ok((player, session))
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .sessions_by_id
            .get(session_id)
            .map(|index| tables.sessions[*index].clone()))
    }

    fn sessions_for_player(&self, player_name: &str) -> Result<Vec<SessionRecord>> {
        let tables = self.read()?;
        Ok(tables.player_history(player_name))
    }

    fn latest_venue_for_player(&self, player_name: &str) -> Result<Option<String>> {
        let tables = self.read()?;
        // Indexes are in insertion order, so the last approved one is the latest
        Ok(tables.sessions_by_player.get(player_name).and_then(|indexes| {
            indexes
                .iter()
                .rev()
                .map(|index| &tables.sessions[*index])
                .find(|session| session.approved)
                .map(|session| session.venue_name.clone())
        }))
    }

    fn sessions_at_venue(&self, venue_name: &str) -> Result<Vec<SessionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .sessions
            .iter()
            .filter(|session| names_match(&session.venue_name, venue_name))
            .cloned()
            .collect())
    }

    fn sessions_in_state(&self, state: &str) -> Result<Vec<SessionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .sessions
            .iter()
            .filter(|session| {
                session
                    .venue_state
                    .as_deref()
                    .is_some_and(|session_state| names_match(session_state, state))
            })
            .cloned()
            .collect())
    }

    fn upsert_venue(&self, venue: Venue) -> Result<Venue> {
        let mut tables = self.write()?;
        let stored = tables
            .venues
            .entry(lookup_key(&venue.name))
            .or_insert(venue);
        Ok(stored.clone())
    }

    fn list_venues(&self, state: Option<&str>) -> Result<Vec<Venue>> {
        let tables = self.read()?;
        let mut venues: Vec<Venue> = tables
            .venues
            .values()
            .filter(|venue| state.map_or(true, |state| names_match(&venue.state, state)))
            .cloned()
            .collect();
        venues.sort_by(|a, b| lookup_key(&a.name).cmp(&lookup_key(&b.name)));
        Ok(venues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionScores;
    use crate::utils::{current_timestamp, generate_record_id};

    fn session(player: &PlayerRecord, venue: &str, state: Option<&str>, after: f64) -> SessionRecord {
        SessionRecord {
            id: generate_record_id(),
            player_name: player.name.clone(),
            venue_name: venue.to_string(),
            venue_state: state.map(str::to_string),
            scores: SessionScores::new(&[100, 100, 100, 100, 100]).unwrap(),
            session_total: 500,
            rating_before: player.current_rating,
            rating_after: after,
            rating_delta: after - player.current_rating,
            is_provisional: true,
            notes: None,
            submitted_at: current_timestamp(),
            approved: true,
        }
    }

    fn record(store: &InMemorySessionStore, name: &str, venue: &str, after: f64) -> SessionRecord {
        let (_, stored) = store
            .record_session(name, venue, &mut |existing, _history, _venue| {
                let player = existing
                    .cloned()
                    .unwrap_or_else(|| PlayerRecord::new(name, 10.0));
                let session = session(&player, venue, Some("NY"), after);
                Ok(PendingSession {
                    player,
                    session,
                    venue: None,
                })
            })
            .unwrap();
        stored
    }

    #[test]
    fn test_record_session_creates_and_updates_player() {
        let store = InMemorySessionStore::new();
        assert!(store.get_player("Rolly").unwrap().is_none());

        record(&store, "Rolly", "Barcade", 10.8);
        let player = store.get_player("Rolly").unwrap().unwrap();
        assert_eq!(player.current_rating, 10.8);
        assert_eq!(player.total_sessions, 1);

        record(&store, "Rolly", "Barcade", 11.1);
        let player = store.get_player("Rolly").unwrap().unwrap();
        assert_eq!(player.current_rating, 11.1);
        assert_eq!(player.total_sessions, 2);
        assert_eq!(store.player_count().unwrap(), 1);
    }

    #[test]
    fn test_builder_sees_history_in_order() {
        let store = InMemorySessionStore::new();
        record(&store, "Rolly", "Barcade", 10.8);
        record(&store, "Rolly", "Ace Bar", 11.1);

        let mut seen = Vec::new();
        store
            .record_session("Rolly", "Barcade", &mut |existing, history, _venue| {
                seen = history.iter().map(|s| s.rating_after).collect();
                let player = existing.cloned().unwrap();
                let session = session(&player, "Barcade", None, 11.5);
                Ok(PendingSession {
                    player,
                    session,
                    venue: None,
                })
            })
            .unwrap();

        assert_eq!(seen, vec![10.8, 11.1]);
    }

    #[test]
    fn test_builder_error_leaves_store_untouched() {
        let store = InMemorySessionStore::new();
        let result = store.record_session("Rolly", "Barcade", &mut |_, _, _| {
            Err(SkeeboardError::InvalidInput {
                reason: "nope".to_string(),
            }
            .into())
        });

        assert!(result.is_err());
        assert_eq!(store.player_count().unwrap(), 0);
        assert!(store.sessions_for_player("Rolly").unwrap().is_empty());
        assert!(store.list_venues(None).unwrap().is_empty());
    }

    fn barcade(state: &str) -> Venue {
        Venue {
            id: generate_record_id(),
            name: "Barcade".to_string(),
            city: "Brooklyn".to_string(),
            state: state.to_string(),
            verified: false,
        }
    }

    #[test]
    fn test_session_registers_venue_with_first_state_winning() {
        let store = InMemorySessionStore::new();

        for state in ["NY", "NJ"] {
            store
                .record_session("Rolly", "barcade", &mut |existing, _, known| {
                    if state == "NJ" {
                        assert_eq!(known.map(|v| v.state.as_str()), Some("NY"));
                    } else {
                        assert!(known.is_none());
                    }
                    let player = existing
                        .cloned()
                        .unwrap_or_else(|| PlayerRecord::new("Rolly", 10.0));
                    let session = session(&player, "Barcade", Some(state), 10.5);
                    Ok(PendingSession {
                        player,
                        session,
                        venue: Some(barcade(state)),
                    })
                })
                .unwrap();
        }

        let venues = store.list_venues(None).unwrap();
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].state, "NY");
    }

    #[test]
    fn test_mismatched_venue_rejected() {
        let store = InMemorySessionStore::new();
        let result = store.record_session("Rolly", "Ace Bar", &mut |_, _, _| {
            let player = PlayerRecord::new("Rolly", 10.0);
            let session = session(&player, "Ace Bar", None, 10.0);
            Ok(PendingSession {
                player,
                session,
                venue: Some(barcade("NY")),
            })
        });

        assert!(result.is_err());
        assert_eq!(store.player_count().unwrap(), 0);
        assert!(store.list_venues(None).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_player_rejected() {
        let store = InMemorySessionStore::new();
        let result = store.record_session("Rolly", "Barcade", &mut |_, _, _| {
            let player = PlayerRecord::new("Someone Else", 10.0);
            let session = session(&player, "Barcade", None, 10.0);
            Ok(PendingSession {
                player,
                session,
                venue: None,
            })
        });

        assert!(result.is_err());
        assert_eq!(store.player_count().unwrap(), 0);
    }

    #[test]
    fn test_latest_venue_skips_flagged_sessions() {
        let store = InMemorySessionStore::new();
        assert!(store.latest_venue_for_player("Rolly").unwrap().is_none());

        record(&store, "Rolly", "Barcade", 10.8);
        record(&store, "Rolly", "Ace Bar", 11.1);
        store
            .record_session("Rolly", "Shuffle Hall", &mut |existing, _, _| {
                let player = existing.cloned().unwrap();
                let mut session = session(&player, "Shuffle Hall", None, player.current_rating);
                session.approved = false;
                Ok(PendingSession {
                    player,
                    session,
                    venue: None,
                })
            })
            .unwrap();

        assert_eq!(
            store.latest_venue_for_player("Rolly").unwrap().as_deref(),
            Some("Ace Bar")
        );
    }

    #[test]
    fn test_session_lookups() {
        let store = InMemorySessionStore::new();
        let first = record(&store, "Rolly", "Barcade", 10.8);
        record(&store, "Skee", "Ace Bar", 10.2);

        assert_eq!(store.get_session(&first.id).unwrap().unwrap(), first);
        assert!(store.get_session(&generate_record_id()).unwrap().is_none());

        assert_eq!(store.sessions_at_venue("barcade").unwrap().len(), 1);
        assert_eq!(store.sessions_in_state("ny").unwrap().len(), 2);
        assert!(store.sessions_in_state("NJ").unwrap().is_empty());
        assert!(store.sessions_for_player("Nobody").unwrap().is_empty());
    }

    #[test]
    fn test_venue_upsert_keeps_first_registration() {
        let store = InMemorySessionStore::new();
        let venue = Venue {
            id: generate_record_id(),
            name: "Barcade".to_string(),
            city: "Brooklyn".to_string(),
            state: "NY".to_string(),
            verified: false,
        };

        let stored = store.upsert_venue(venue.clone()).unwrap();
        assert_eq!(stored, venue);

        let duplicate = Venue {
            id: generate_record_id(),
            name: "BARCADE".to_string(),
            city: "Jersey City".to_string(),
            state: "NJ".to_string(),
            verified: false,
        };
        let stored = store.upsert_venue(duplicate).unwrap();
        assert_eq!(stored.id, venue.id);
        assert_eq!(stored.state, "NY");

        assert_eq!(store.list_venues(Some("ny")).unwrap().len(), 1);
        assert!(store.list_venues(Some("NJ")).unwrap().is_empty());
        assert_eq!(store.list_venues(None).unwrap().len(), 1);
    }
}
