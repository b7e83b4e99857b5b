//! Bracket API handlers.
//!
//! Operator surface over the bracket manager:
//! - Listing the brackets of an event
//! - Reading one category's bracket, including the projected tree
//! - Generating (or redrawing) round 1
//! - Recording a match result
//! - Advancing to the next round
//!
//! Writes accept an optional `expected_version`; when given, the request
//! fails with `409 Conflict` if the bracket changed since the caller read it.
//!
//! # Examples
//!
//! Generate from paid registrations:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/events/$EVENT/categories/$CATEGORY/bracket \
//!   -H "Content-Type: application/json" -d '{}'
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/events/$EVENT/categories/$CATEGORY/bracket/results \
//!   -H "Content-Type: application/json" \
//!   -d '{"round": 1, "position": 0, "winner": "a", "expected_version": 1}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use dojo_brackets::{
    Advancement, Bracket, BracketError, BracketKey, BracketVersion, Match, Participant, Round,
    SlotSide,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    InProgress,
    Complete,
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub event_id: Uuid,
    pub category_id: Uuid,
    pub version: BracketVersion,
    pub status: BracketStatus,
    pub entrant_count: usize,
    pub current_round: u32,
    pub total_rounds: u32,
    pub champion: Option<Participant>,
    pub rounds: Vec<Round>,
    /// Played rounds followed by placeholder rounds down to the final
    pub projected_rounds: Vec<Round>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bracket> for BracketResponse {
    fn from(bracket: Bracket) -> Self {
        let status = if bracket.is_complete() {
            BracketStatus::Complete
        } else {
            BracketStatus::InProgress
        };

        Self {
            event_id: bracket.key.event_id,
            category_id: bracket.key.category_id,
            version: bracket.version,
            status,
            entrant_count: bracket.entrant_count,
            current_round: bracket.rounds.len() as u32,
            total_rounds: bracket.total_rounds(),
            champion: bracket.champion().cloned(),
            projected_rounds: bracket.projected_rounds(),
            created_at: bracket.created_at,
            updated_at: bracket.updated_at,
            rounds: bracket.rounds,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BracketSummary {
    pub category_id: Uuid,
    pub version: BracketVersion,
    pub status: BracketStatus,
    pub entrant_count: usize,
    pub current_round: u32,
    pub total_rounds: u32,
    pub pending_matches: usize,
    pub champion: Option<Participant>,
}

impl From<&Bracket> for BracketSummary {
    fn from(bracket: &Bracket) -> Self {
        Self {
            category_id: bracket.key.category_id,
            version: bracket.version,
            status: if bracket.is_complete() {
                BracketStatus::Complete
            } else {
                BracketStatus::InProgress
            },
            entrant_count: bracket.entrant_count,
            current_round: bracket.rounds.len() as u32,
            total_rounds: bracket.total_rounds(),
            pending_matches: bracket.pending_matches().count(),
            champion: bracket.champion().cloned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateBracketRequest {
    /// Explicit entrants; resolved from paid registrations when absent
    pub participants: Option<Vec<Participant>>,
    pub expected_version: Option<BracketVersion>,
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub round: u32,
    pub position: usize,
    pub winner: SlotSide,
    #[serde(default)]
    pub expected_version: Option<BracketVersion>,
}

#[derive(Debug, Serialize)]
pub struct RecordResultResponse {
    #[serde(rename = "match")]
    pub decided: Match,
    pub bracket: BracketResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdvanceQuery {
    pub expected_version: Option<BracketVersion>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub outcome: Advancement,
    pub bracket: BracketResponse,
}

/// Map a bracket error to its HTTP status
pub fn status_for(err: &BracketError) -> StatusCode {
    match err {
        BracketError::InsufficientParticipants { .. } | BracketError::DuplicateParticipant(_) => {
            StatusCode::BAD_REQUEST
        }
        BracketError::NotFound(_) => StatusCode::NOT_FOUND,
        BracketError::BracketAlreadyInProgress(_)
        | BracketError::InvalidMatchState { .. }
        | BracketError::MatchNotReady { .. }
        | BracketError::RoundIncomplete { .. }
        | BracketError::StaleBracketVersion { .. } => StatusCode::CONFLICT,
        BracketError::Database(_) | BracketError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: BracketError, request_id: &RequestId) -> ApiError {
    let status = status_for(&err);
    metrics::bracket_errors_total(err.kind());

    if status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            kind = err.kind(),
            "Bracket operation failed: {}",
            err
        );
    } else {
        tracing::debug!(
            request_id = %request_id,
            kind = err.kind(),
            "Bracket operation rejected: {}",
            err
        );
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
            kind: err.kind(),
        }),
    )
}

/// List the brackets of an event.
///
/// # Response
///
/// Returns `200 OK` with one summary per generated category, oldest first.
pub async fn list_event_brackets(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<BracketSummary>>, ApiError> {
    let brackets = state
        .bracket_manager
        .list_for_event(event_id)
        .await
        .map_err(|err| error_response(err, &request_id))?;

    Ok(Json(brackets.iter().map(BracketSummary::from).collect()))
}

/// Get the bracket of one category.
///
/// # Errors
///
/// Returns `404 Not Found` if no bracket was generated yet.
pub async fn get_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((event_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BracketResponse>, ApiError> {
    let key = BracketKey::new(event_id, category_id);

    state
        .bracket_manager
        .get(key)
        .await
        .map_err(|err| error_response(err, &request_id))?
        .map(|bracket| Json(BracketResponse::from(bracket)))
        .ok_or_else(|| error_response(BracketError::NotFound(key), &request_id))
}

/// Generate (or redraw) round 1 of a category.
///
/// # Response
///
/// Returns `201 Created` with the new bracket.
///
/// # Errors
///
/// - `400 Bad Request`: fewer than two entrants, or a duplicated entrant
/// - `409 Conflict`: results already recorded, or stale `expected_version`
pub async fn generate_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((event_id, category_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<GenerateBracketRequest>,
) -> Result<(StatusCode, Json<BracketResponse>), ApiError> {
    let key = BracketKey::new(event_id, category_id);

    let participants = match request.participants {
        Some(participants) => participants,
        None => state
            .participants
            .eligible_participants(key)
            .await
            .map_err(|err| error_response(err, &request_id))?,
    };

    let bracket = state
        .bracket_manager
        .generate(key, participants, request.expected_version)
        .await
        .map_err(|err| error_response(err, &request_id))?;

    let redraw = bracket.version > 1;
    metrics::brackets_generated_total(redraw);
    metrics::bracket_entrants(bracket.entrant_count);
    logging::log_bracket_event(
        if redraw { "redrawn" } else { "generated" },
        &key,
        bracket.version,
        request_id.as_str(),
        &format!("Round 1 drawn with {} entrants", bracket.entrant_count),
    );

    Ok((StatusCode::CREATED, Json(BracketResponse::from(bracket))))
}

/// Record the winner of one match.
///
/// # Errors
///
/// - `404 Not Found`: no bracket for this category
/// - `409 Conflict`: match decided, a bye, not ready yet, or stale `expected_version`
pub async fn record_result(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((event_id, category_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RecordResultRequest>,
) -> Result<Json<RecordResultResponse>, ApiError> {
    let key = BracketKey::new(event_id, category_id);

    let (decided, bracket) = state
        .bracket_manager
        .record_result(
            key,
            request.round,
            request.position,
            request.winner,
            request.expected_version,
        )
        .await
        .map_err(|err| error_response(err, &request_id))?;

    metrics::match_results_recorded_total();
    logging::log_bracket_event(
        "result_recorded",
        &key,
        bracket.version,
        request_id.as_str(),
        &format!(
            "Round {} match {} won by slot {}",
            request.round, request.position, request.winner
        ),
    );

    if bracket.is_complete() {
        metrics::tournaments_completed_total();
        if let Some(champion) = bracket.champion() {
            logging::log_bracket_event(
                "completed",
                &key,
                bracket.version,
                request_id.as_str(),
                &format!("Champion: {}", champion.label),
            );
        }
    }

    Ok(Json(RecordResultResponse {
        decided,
        bracket: BracketResponse::from(bracket),
    }))
}

/// Advance to the next round, or report the champion.
///
/// Once the final is decided, repeated calls keep returning the champion.
///
/// # Errors
///
/// - `404 Not Found`: no bracket for this category
/// - `409 Conflict`: pending matches left, or stale `expected_version`
pub async fn advance_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((event_id, category_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AdvanceQuery>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let key = BracketKey::new(event_id, category_id);

    let (outcome, bracket) = state
        .bracket_manager
        .advance(key, query.expected_version)
        .await
        .map_err(|err| error_response(err, &request_id))?;

    if let Advancement::NextRound { round, matches } = &outcome {
        metrics::rounds_advanced_total();
        logging::log_bracket_event(
            "advanced",
            &key,
            bracket.version,
            request_id.as_str(),
            &format!("Round {} created with {} matches", round, matches),
        );
    }

    Ok(Json(AdvanceResponse {
        outcome,
        bracket: BracketResponse::from(bracket),
    }))
}
