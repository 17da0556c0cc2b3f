//! Session ingestion and player lookups
//!
//! [`SessionLedger`] turns a raw submission into an immutable session
//! record and an updated player in one atomic store call, and serves the
//! read side (profiles, history, venues) over the same store.

use crate::config::IngestionSettings;
use crate::error::{Result, SkeeboardError};
use crate::ledger::store::{PendingSession, SessionStore};
use crate::ledger::validation::{
    suspicion, SessionSubmission, SuspicionReason, ValidSubmission, VenueDetails,
    VenueRegistration,
};
use crate::metrics::MetricsCollector;
use crate::rating::{display_rating, PlayerProfile, RatingCalculator, RatingState, RatingUpdate, TourCard};
use crate::types::{PlayerRecord, SessionId, SessionRecord, Venue};
use crate::utils::{current_timestamp, generate_record_id};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a successful submission returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReceipt {
    pub session: SessionRecord,
    pub new_rating: f64,
    pub delta: f64,
    pub is_provisional: bool,
    pub display_rating: String,
    pub session_total: u32,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<SuspicionReason>,
}

/// Session ledger service
pub struct SessionLedger {
    store: Arc<dyn SessionStore>,
    calculator: Arc<dyn RatingCalculator>,
    settings: IngestionSettings,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SessionLedger {
    /// Create a new session ledger
    pub fn new(
        store: Arc<dyn SessionStore>,
        calculator: Arc<dyn RatingCalculator>,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            store,
            calculator,
            settings,
            metrics: None,
        }
    }

    /// Report ingestion metrics to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    pub fn calculator(&self) -> Arc<dyn RatingCalculator> {
        self.calculator.clone()
    }

    /// Validate, rate and record one session
    pub fn submit(&self, submission: SessionSubmission) -> Result<SessionReceipt> {
        let timer = self.metrics.as_ref().map(|m| m.start_timer());

        let valid = match submission.validate() {
            Ok(valid) => valid,
            Err(error) => {
                self.record_rejection(&error);
                return Err(error);
            }
        };

        let flag_reason = if self.settings.flag_suspicious_sessions {
            suspicion(&valid.scores)
        } else {
            None
        };

        let mut rated: Option<RatingUpdate> = None;
        let (player, session) = self.store.record_session(
            &valid.player_name,
            &valid.venue.name,
            &mut |existing: Option<&PlayerRecord>,
                  history: &[SessionRecord],
                  known: Option<&Venue>| {
                let player = existing.cloned().unwrap_or_else(|| {
                    PlayerRecord::new(valid.player_name.clone(), self.calculator.seed_rating())
                });
                let (venue_state, venue) = resolve_venue(&valid.venue, known);

                let session = match flag_reason {
                    Some(_) => self.flagged_session(&player, &valid, venue_state),
                    None => {
                        let update = self.rate(&player, &valid, history)?;
                        rated = Some(update);
                        self.approved_session(&player, &valid, venue_state, &update)
                    }
                };

                Ok(PendingSession {
                    player,
                    session,
                    venue,
                })
            },
        )?;

        match flag_reason {
            Some(reason) => warn!(
                "Session flagged for review - player: '{}', venue: '{}', reason: {}",
                player.name, session.venue_name, reason
            ),
            None => info!(
                "Session recorded - player: '{}', venue: '{}', total: {}, rating: {:.1} -> {:.1}",
                player.name,
                session.venue_name,
                session.session_total,
                session.rating_before,
                session.rating_after
            ),
        }

        if let Some(metrics) = &self.metrics {
            let outcome = if session.approved { "approved" } else { "flagged" };
            metrics.record_session_submitted(outcome);
            if let Some(update) = &rated {
                metrics.record_rating_change(update.delta, update.new_rating);
                if update.established {
                    metrics.record_provisional_exit();
                }
            }
            if let Ok(count) = self.store.player_count() {
                metrics.set_players_tracked(count);
            }
            if let Some(timer) = timer {
                metrics.record_ingestion(timer.stop());
            }
        }

        Ok(SessionReceipt {
            new_rating: player.current_rating,
            delta: session.rating_delta,
            is_provisional: player.is_provisional,
            display_rating: display_rating(player.current_rating, player.is_provisional),
            session_total: session.session_total,
            approved: session.approved,
            flag_reason,
            session,
        })
    }

    fn rate(
        &self,
        player: &PlayerRecord,
        valid: &ValidSubmission,
        history: &[SessionRecord],
    ) -> Result<RatingUpdate> {
        let prior = RatingState {
            rating: player.current_rating,
            session_count: player.total_sessions,
        };
        let prior_totals: Vec<u32> = history
            .iter()
            .filter(|session| session.approved)
            .map(|session| session.session_total)
            .collect();

        let update = self
            .calculator
            .rate_session(&prior, &valid.scores, &prior_totals)?;

        debug!(
            "Rated session for '{}': {:?} (prior sessions: {})",
            player.name, update, prior.session_count
        );

        Ok(update)
    }

    fn approved_session(
        &self,
        player: &PlayerRecord,
        valid: &ValidSubmission,
        venue_state: Option<String>,
        update: &RatingUpdate,
    ) -> SessionRecord {
        SessionRecord {
            id: generate_record_id(),
            player_name: player.name.clone(),
            venue_name: valid.venue.name.clone(),
            venue_state,
            scores: valid.scores,
            session_total: update.session_total,
            rating_before: update.rating_before,
            rating_after: update.new_rating,
            rating_delta: update.delta,
            is_provisional: update.is_provisional,
            notes: valid.notes.clone(),
            submitted_at: current_timestamp(),
            approved: true,
        }
    }

    /// Flagged sessions are kept but leave the rating where it was
    fn flagged_session(
        &self,
        player: &PlayerRecord,
        valid: &ValidSubmission,
        venue_state: Option<String>,
    ) -> SessionRecord {
        SessionRecord {
            id: generate_record_id(),
            player_name: player.name.clone(),
            venue_name: valid.venue.name.clone(),
            venue_state,
            scores: valid.scores,
            session_total: valid.scores.total(),
            rating_before: player.current_rating,
            rating_after: player.current_rating,
            rating_delta: 0.0,
            is_provisional: player.is_provisional,
            notes: valid.notes.clone(),
            submitted_at: current_timestamp(),
            approved: false,
        }
    }

    fn record_rejection(&self, error: &anyhow::Error) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        metrics.record_session_submitted("rejected");
        if let Some(SkeeboardError::Validation { issues }) = error.downcast_ref::<SkeeboardError>() {
            for issue in issues {
                metrics.record_validation_failure(&issue.field);
            }
        }
    }

    /// Get a player's current record
    pub fn player(&self, player_name: &str) -> Result<PlayerRecord> {
        let player_name = player_name.trim();
        self.store.get_player(player_name)?.ok_or_else(|| {
            SkeeboardError::PlayerNotFound {
                player_name: player_name.to_string(),
            }
            .into()
        })
    }

    /// Build the full profile for a player
    pub fn player_profile(&self, player_name: &str) -> Result<PlayerProfile> {
        let player = self.player(player_name)?;
        let sessions = self.store.sessions_for_player(&player.name)?;

        Ok(PlayerProfile::build(
            &player,
            &sessions,
            self.settings.profile_recent_sessions,
        ))
    }

    /// Shareable card for a player
    pub fn tour_card(&self, player_name: &str) -> Result<TourCard> {
        let profile = self.player_profile(player_name)?;
        Ok(TourCard::from(&profile))
    }

    /// All of a player's sessions, newest first. Unknown players have none.
    pub fn player_sessions(&self, player_name: &str) -> Result<Vec<SessionRecord>> {
        let mut sessions = self.store.sessions_for_player(player_name.trim())?;
        sessions.reverse();
        Ok(sessions)
    }

    /// Look up one session
    pub fn session(&self, session_id: &SessionId) -> Result<SessionRecord> {
        self.store.get_session(session_id)?.ok_or_else(|| {
            SkeeboardError::SessionNotFound {
                session_id: session_id.to_string(),
            }
            .into()
        })
    }

    /// Register a venue, returning the stored one if the name already exists
    pub fn register_venue(&self, registration: VenueRegistration) -> Result<Venue> {
        let details = registration.validate()?;

        let venue = self.store.upsert_venue(Venue {
            id: generate_record_id(),
            name: details.name,
            city: details.city.unwrap_or_default(),
            state: details.state.unwrap_or_default(),
            verified: false,
        })?;

        info!("Venue registered: '{}' ({}, {})", venue.name, venue.city, venue.state);
        Ok(venue)
    }

    /// List venues, optionally for one state
    pub fn venues(&self, state: Option<&str>) -> Result<Vec<Venue>> {
        let state = state.map(str::trim).filter(|s| !s.is_empty());
        self.store.list_venues(state)
    }
}

/// State for the session's venue plus the venue to register with it.
///
/// A registered venue keeps its own state. An unknown venue is registered
/// when the submission names both city and state.
fn resolve_venue(details: &VenueDetails, known: Option<&Venue>) -> (Option<String>, Option<Venue>) {
    if let Some(known) = known {
        return (Some(known.state.clone()), None);
    }

    match (&details.city, &details.state) {
        (Some(city), Some(state)) => (
            Some(state.clone()),
            Some(Venue {
                id: generate_record_id(),
                name: details.name.clone(),
                city: city.clone(),
                state: state.clone(),
                verified: false,
            }),
        ),
        _ => (details.state.clone(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::InMemorySessionStore;
    use crate::rating::calculator::MockRatingCalculator;
    use crate::rating::ArmRatingCalculator;

    fn ledger() -> SessionLedger {
        SessionLedger::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(ArmRatingCalculator::default()),
            IngestionSettings::default(),
        )
    }

    fn submission(player: &str, scores: [i64; 5]) -> SessionSubmission {
        SessionSubmission {
            player_name: player.to_string(),
            venue_name: "Barcade".to_string(),
            city: Some("Brooklyn".to_string()),
            state: Some("NY".to_string()),
            scores: scores.to_vec(),
            notes: None,
        }
    }

    #[test]
    fn test_first_session_seeds_and_rates() {
        let ledger = ledger();
        let receipt = ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();

        assert!(receipt.approved);
        assert_eq!(receipt.session_total, 300);
        assert_eq!(receipt.session.rating_before, 10.0);
        // 300 beats the 241.7 expected at 10.0
        assert_eq!(receipt.new_rating, 10.1);
        assert_eq!(receipt.delta, 0.1);
        assert!(receipt.is_provisional);
        assert!(receipt.display_rating.ends_with('p'));
        assert_eq!(receipt.session.venue_state.as_deref(), Some("NY"));
    }

    #[test]
    fn test_third_session_establishes_rating() {
        let ledger = ledger();
        ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();
        ledger.submit(submission("Rolly", [60, 60, 70, 60, 70])).unwrap();
        let receipt = ledger.submit(submission("Rolly", [60, 60, 60, 60, 70])).unwrap();

        // average of 300, 320, 310
        assert_eq!(receipt.new_rating, 13.4);
        assert!(!receipt.is_provisional);
        assert_eq!(receipt.display_rating, "13.4");

        let player = ledger.player("Rolly").unwrap();
        assert_eq!(player.total_sessions, 3);
        assert!(!player.is_provisional);
    }

    #[test]
    fn test_flagged_session_leaves_rating() {
        let ledger = ledger();
        let first = ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();
        let flagged = ledger.submit(submission("Rolly", [900; 5])).unwrap();

        assert!(!flagged.approved);
        assert_eq!(flagged.flag_reason, Some(SuspicionReason::AllMaxScores));
        assert_eq!(flagged.delta, 0.0);
        assert_eq!(flagged.new_rating, first.new_rating);
        assert_eq!(ledger.player("Rolly").unwrap().total_sessions, 1);
        assert_eq!(ledger.player_sessions("Rolly").unwrap().len(), 2);
    }

    #[test]
    fn test_flagging_can_be_disabled() {
        let ledger = SessionLedger::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(ArmRatingCalculator::default()),
            IngestionSettings {
                flag_suspicious_sessions: false,
                ..IngestionSettings::default()
            },
        );

        let receipt = ledger.submit(submission("Rolly", [0; 5])).unwrap();
        assert!(receipt.approved);
        assert_eq!(receipt.new_rating, 9.5);
        assert_eq!(receipt.delta, -0.5);
    }

    #[test]
    fn test_invalid_submission_stores_nothing() {
        let ledger = ledger();
        let result = ledger.submit(submission("Rolly", [50, 60, 45, 70, 80]));

        assert!(matches!(
            result.unwrap_err().downcast_ref::<SkeeboardError>(),
            Some(SkeeboardError::Validation { .. })
        ));
        assert!(ledger.player("Rolly").is_err());
        assert!(ledger.venues(None).unwrap().is_empty());
    }

    #[test]
    fn test_calculator_receives_prior_state_and_totals() {
        let mut calculator = MockRatingCalculator::new();
        calculator.expect_seed_rating().return_const(10.0);
        calculator
            .expect_rate_session()
            .times(2)
            .returning(|prior, scores, totals| {
                assert_eq!(totals.len() as u32, prior.session_count);
                Ok(RatingUpdate {
                    rating_before: prior.rating,
                    new_rating: prior.rating + 1.0,
                    delta: 1.0,
                    session_total: scores.total(),
                    is_provisional: true,
                    established: false,
                })
            });

        let ledger = SessionLedger::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(calculator),
            IngestionSettings::default(),
        );

        ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();
        let second = ledger.submit(submission("Rolly", [50, 60, 40, 70, 90])).unwrap();

        assert_eq!(second.session.rating_before, 11.0);
        assert_eq!(second.new_rating, 12.0);
    }

    #[test]
    fn test_calculator_failure_stores_nothing() {
        let mut calculator = MockRatingCalculator::new();
        calculator.expect_seed_rating().return_const(10.0);
        calculator.expect_rate_session().returning(|_, _, _| {
            Err(SkeeboardError::InvalidInput {
                reason: "broken".to_string(),
            }
            .into())
        });

        let ledger = SessionLedger::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(calculator),
            IngestionSettings::default(),
        );

        assert!(ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).is_err());
        assert!(ledger.player_sessions("Rolly").unwrap().is_empty());
        assert!(ledger.player("Rolly").is_err());
        assert!(ledger.venues(None).unwrap().is_empty());
    }

    #[test]
    fn test_known_venue_keeps_its_state() {
        let ledger = ledger();
        ledger
            .register_venue(VenueRegistration {
                name: "Barcade".to_string(),
                city: "Jersey City".to_string(),
                state: "NJ".to_string(),
            })
            .unwrap();

        // Submitted as NY, but the venue is already registered in NJ
        let receipt = ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();
        assert_eq!(receipt.session.venue_state.as_deref(), Some("NJ"));
        assert_eq!(ledger.venues(None).unwrap().len(), 1);
    }

    #[test]
    fn test_venue_state_comes_from_registered_venue() {
        let ledger = ledger();
        ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();

        let mut bare = submission("Skee", [50, 60, 40, 70, 80]);
        bare.city = None;
        bare.state = None;
        let receipt = ledger.submit(bare).unwrap();

        assert_eq!(receipt.session.venue_state.as_deref(), Some("NY"));
        assert_eq!(ledger.venues(Some("ny")).unwrap().len(), 1);
    }

    #[test]
    fn test_lookups_of_unknown_records() {
        let ledger = ledger();

        assert!(matches!(
            ledger.player_profile("Nobody").unwrap_err().downcast_ref::<SkeeboardError>(),
            Some(SkeeboardError::PlayerNotFound { .. })
        ));
        assert!(matches!(
            ledger.session(&generate_record_id()).unwrap_err().downcast_ref::<SkeeboardError>(),
            Some(SkeeboardError::SessionNotFound { .. })
        ));
        assert!(ledger.player_sessions("Nobody").unwrap().is_empty());
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let ledger = ledger().with_metrics(metrics.clone());

        ledger.submit(submission("Rolly", [50, 60, 40, 70, 80])).unwrap();
        ledger.submit(submission("Rolly", [0; 5])).unwrap();
        let _ = ledger.submit(submission("", [50, 60, 40, 70, 85]));

        let submitted = &metrics.sessions().sessions_submitted_total;
        assert_eq!(submitted.with_label_values(&["approved"]).get(), 1);
        assert_eq!(submitted.with_label_values(&["flagged"]).get(), 1);
        assert_eq!(submitted.with_label_values(&["rejected"]).get(), 1);

        let failures = &metrics.sessions().validation_failures_total;
        assert_eq!(failures.with_label_values(&["playerName"]).get(), 1);
        assert_eq!(failures.with_label_values(&["scores"]).get(), 1);
        assert_eq!(metrics.sessions().players_tracked.get(), 1);
    }
}
