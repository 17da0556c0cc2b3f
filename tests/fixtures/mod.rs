//! Test fixtures shared by the integration tests
#![allow(dead_code)]

use skeeboard::config::{AppConfig, IngestionSettings, LeaderboardSettings};
use skeeboard::error::{Result, SkeeboardError};
use skeeboard::leaderboard::LeaderboardService;
use skeeboard::ledger::{
    InMemorySessionStore, SessionBuilder, SessionLedger, SessionStore, SessionSubmission,
};
use skeeboard::rating::ArmRatingCalculator;
use skeeboard::service::AppState;
use skeeboard::skeecaptain::InMemoryApplicationStore;
use skeeboard::types::{PlayerRecord, SessionId, SessionRecord, Venue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Session store whose every operation fails like an unreachable database
#[derive(Debug, Default)]
pub struct FailingSessionStore {
    attempts: AtomicUsize,
}

impl FailingSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls made against the store
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SkeeboardError::StorageFailure {
            message: "connection refused: postgres://ledger-db:5432".to_string(),
        }
        .into())
    }
}

impl SessionStore for FailingSessionStore {
    fn get_player(&self, _player_name: &str) -> Result<Option<PlayerRecord>> {
        self.fail()
    }

    fn get_players(&self) -> Result<Vec<PlayerRecord>> {
        self.fail()
    }

    fn player_count(&self) -> Result<usize> {
        self.fail()
    }

    fn record_session(
        &self,
        _player_name: &str,
        _venue_name: &str,
        _build: &mut SessionBuilder<'_>,
    ) -> Result<(PlayerRecord, SessionRecord)> {
        self.fail()
    }

    fn get_session(&self, _session_id: &SessionId) -> Result<Option<SessionRecord>> {
        self.fail()
    }

    fn sessions_for_player(&self, _player_name: &str) -> Result<Vec<SessionRecord>> {
        self.fail()
    }

    fn latest_venue_for_player(&self, _player_name: &str) -> Result<Option<String>> {
        self.fail()
    }

    fn sessions_at_venue(&self, _venue_name: &str) -> Result<Vec<SessionRecord>> {
        self.fail()
    }

    fn sessions_in_state(&self, _state: &str) -> Result<Vec<SessionRecord>> {
        self.fail()
    }

    fn upsert_venue(&self, _venue: Venue) -> Result<Venue> {
        self.fail()
    }

    fn list_venues(&self, _state: Option<&str>) -> Result<Vec<Venue>> {
        self.fail()
    }
}

/// A ledger and leaderboard sharing one in-memory store
pub struct TestLedger {
    pub store: Arc<InMemorySessionStore>,
    pub ledger: SessionLedger,
    pub leaderboard: LeaderboardService,
}

pub fn create_test_ledger() -> TestLedger {
    create_test_ledger_with(IngestionSettings::default())
}

pub fn create_test_ledger_with(settings: IngestionSettings) -> TestLedger {
    let store = Arc::new(InMemorySessionStore::new());
    let ledger = SessionLedger::new(
        store.clone(),
        Arc::new(ArmRatingCalculator::default()),
        settings,
    );
    let leaderboard = LeaderboardService::new(store.clone(), LeaderboardSettings::default());

    TestLedger {
        store,
        ledger,
        leaderboard,
    }
}

/// Build a submission at a venue with a known state
pub fn submission(player: &str, venue: &str, state: &str, scores: [i64; 5]) -> SessionSubmission {
    SessionSubmission {
        player_name: player.to_string(),
        venue_name: venue.to_string(),
        city: Some("Somewhere".to_string()),
        state: Some(state.to_string()),
        scores: scores.to_vec(),
        notes: None,
    }
}

/// Five uneven scores adding up to `total`.
///
/// `total` must be a multiple of 10 between 10 and 4000.
pub fn scores_totalling(total: i64) -> [i64; 5] {
    let base = (total / 50) * 10;
    let mut scores = [base; 5];
    scores[0] += total - base * 5;

    // Identical games would be flagged as suspicious
    if scores.iter().all(|score| *score == scores[0]) {
        scores[0] -= 10;
        scores[1] += 10;
    }
    scores
}

/// Application state over in-memory stores, already running
pub async fn running_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new(AppConfig::default()).expect("valid default config"));
    state.start().await;
    state
}

/// Application state whose session store always fails
pub async fn failing_state() -> Arc<AppState> {
    let state = Arc::new(
        AppState::with_stores(
            AppConfig::default(),
            Arc::new(FailingSessionStore::new()),
            Arc::new(InMemoryApplicationStore::new()),
        )
        .expect("valid default config"),
    );
    state.start().await;
    state
}
