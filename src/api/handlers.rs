//! HTTP handlers
//!
//! Handlers are thin: they decode the request, call into the ledger,
//! leaderboard or skeecaptain services and encode the result.

use crate::api::error::ApiError;
use crate::error::SkeeboardError;
use crate::leaderboard::{parse_scope, LeaderboardPage, LeaderboardQuery};
use crate::ledger::{SessionReceipt, SessionSubmission, VenueRegistration};
use crate::rating::{PlayerProfile, TourCard};
use crate::service::{AppState, HealthCheck, HealthStatus};
use crate::skeecaptain::{ApplicationRequest, SkeecaptainApplication};
use crate::types::{SessionRecord, Venue};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct VenueListQuery {
    pub state: Option<String>,
}

/// Root endpoint - shows service information
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/sessions",
            "/api/players/{name}",
            "/api/leaderboard/{scope}",
            "/api/venues",
            "/api/skeecaptain/apply",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

pub async fn submit_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionReceipt>)> {
    let Json(submission) = payload.map_err(|rejection| {
        state.metrics().record_session_submitted("rejected");
        state.metrics().record_validation_failure("body");
        ApiError::from_json_rejection(rejection)
    })?;

    let receipt = state.ledger().submit(submission)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionRecord>> {
    let session_id = Uuid::parse_str(id.trim())
        .map_err(|_| SkeeboardError::invalid_field("id", "must be a UUID"))?;

    Ok(Json(state.ledger().session(&session_id)?))
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<PlayerProfile>> {
    Ok(Json(state.ledger().player_profile(&name)?))
}

pub async fn get_player_sessions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<SessionRecord>>> {
    Ok(Json(state.ledger().player_sessions(&name)?))
}

pub async fn get_player_card(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<TourCard>> {
    Ok(Json(state.ledger().tour_card(&name)?))
}

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(scope): Path<String>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Json<LeaderboardPage>> {
    let Query(query) = query.map_err(ApiError::from_query_rejection)?;
    let scope = parse_scope(&scope, query.filter.as_deref())?;

    let page = state
        .leaderboard()
        .leaderboard(&scope, query.limit, query.offset)?;
    Ok(Json(page))
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VenueListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Venue>>> {
    let Query(query) = query.map_err(ApiError::from_query_rejection)?;
    Ok(Json(state.ledger().venues(query.state.as_deref())?))
}

pub async fn register_venue(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VenueRegistration>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Venue>)> {
    let Json(registration) = payload.map_err(ApiError::from_json_rejection)?;
    let venue = state.ledger().register_venue(registration)?;
    Ok((StatusCode::CREATED, Json(venue)))
}

pub async fn apply_skeecaptain(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApplicationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SkeecaptainApplication>)> {
    let Json(request) = payload.map_err(ApiError::from_json_rejection)?;
    let application = state.skeecaptain().apply(request)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_applications(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SkeecaptainApplication>>> {
    Ok(Json(state.skeecaptain().applications()?))
}

/// Liveness probe with a JSON body
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let service = state.config().service.name.clone();
    let (status, label) = match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, HealthStatus::Healthy),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, HealthStatus::Degraded),
        Ok(HealthStatus::Unhealthy) | Err(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
        }
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": service,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness probe with the full component report
pub async fn ready(State(state): State<Arc<AppState>>) -> Response {
    debug!("Readiness check requested");

    match HealthCheck::check(state).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready").into_response()
        }
    }
}

/// Prometheus metrics in the text exposition format
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let collector = state.metrics();
    collector.set_uptime(state.uptime());
    if let Ok(players) = state.ledger().store().player_count() {
        collector.set_players_tracked(players);
    }

    match collector.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}
