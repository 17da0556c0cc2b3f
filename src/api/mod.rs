//! HTTP API
//!
//! JSON endpoints for session submission, player lookups, leaderboards,
//! venues and skeecaptain applications, plus health and metrics.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use server::{router, ApiServer};
