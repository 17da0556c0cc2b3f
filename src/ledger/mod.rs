//! Session ledger
//!
//! This module provides session storage, submission validation and the
//! ingestion service that rates sessions and keeps players current.

pub mod ingestion;
pub mod store;
pub mod validation;

pub use ingestion::{SessionLedger, SessionReceipt};
pub use store::{InMemorySessionStore, PendingSession, SessionBuilder, SessionStore};
pub use validation::{
    suspicion, SessionSubmission, SuspicionReason, ValidSubmission, VenueDetails,
    VenueRegistration,
};
