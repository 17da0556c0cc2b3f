//! Utility functions for the skeeboard service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique record ID (sessions, venues, applications)
pub fn generate_record_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Round a rating to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Case-insensitive comparison used for venue names and states
pub fn names_match(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Lookup key for case-insensitive maps
pub fn lookup_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
