//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventRecord, ProposalTally};
use crate::feed::LiveTally;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub live: LiveTally,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/proposals/:index/events", get(get_proposal_events))
        .route("/proposals/:index/tally", get(get_proposal_tally))
        .route("/votes", get(get_vote_history))
        .route("/tallies", get(get_tallies))
        .route("/tallies/live", get(get_live_tallies))
        .route("/voters/:address", get(get_voter))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub proposal_index: u32,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct TalliesResponse {
    pub total_votes: i64,
    pub tallies: Vec<ProposalTally>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct LedgerRange {
    pub from_ledger: Option<i64>,
    pub to_ledger: Option<i64>,
}

impl TalliesResponse {
    fn new(tallies: Vec<ProposalTally>) -> Self {
        Self {
            total_votes: tallies.iter().map(|t| t.votes).sum(),
            tallies,
        }
    }
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn internal_error(e: IndexerError) -> Response {
    tracing::error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /proposals/:index/events`
///
/// Returns all indexed events for the given proposal index.
pub async fn get_proposal_events(
    State(state): State<Arc<ApiState>>,
    Path(proposal_index): Path<u32>,
) -> Response {
    match db::get_events_for_proposal(&state.pool, proposal_index as i64).await {
        Ok(events) => Json(EventsResponse {
            proposal_index,
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /events`
///
/// Returns all indexed events across all proposals.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => Json(AllEventsResponse {
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /votes?from_ledger=&to_ledger=`
pub async fn get_vote_history(
    State(state): State<Arc<ApiState>>,
    Query(range): Query<LedgerRange>,
) -> Response {
    if let (Some(from), Some(to)) = (range.from_ledger, range.to_ledger) {
        if from > to {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("from_ledger ({from}) is after to_ledger ({to})"),
            );
        }
    }
    match db::get_vote_history(&state.pool, range.from_ledger, range.to_ledger).await {
        Ok(events) => Json(AllEventsResponse {
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /tallies`
///
/// Counts computed straight from the stored events.
pub async fn get_tallies(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_tallies(&state.pool).await {
        Ok(tallies) => Json(TalliesResponse::new(tallies)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /tallies/live`
///
/// Counts held by the live tally; may trail `/tallies` by one notice.
pub async fn get_live_tallies(State(state): State<Arc<ApiState>>) -> Response {
    Json(TalliesResponse::new(state.live.snapshot().await)).into_response()
}

/// `GET /proposals/:index/tally`
pub async fn get_proposal_tally(
    State(state): State<Arc<ApiState>>,
    Path(proposal_index): Path<u32>,
) -> Response {
    match db::get_proposal_tally(&state.pool, proposal_index as i64).await {
        Ok(tally) => Json(tally).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /voters/:address`
pub async fn get_voter(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    if address.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "address must not be empty");
    }
    match db::get_voter_activity(&state.pool, &address).await {
        Ok(activity) => Json(activity).into_response(),
        Err(e) => internal_error(e),
    }
}
