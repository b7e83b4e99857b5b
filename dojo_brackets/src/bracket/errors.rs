//! Bracket error types.

use super::models::{BracketKey, BracketVersion};
use thiserror::Error;

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    /// Fewer than two entrants in the pool
    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    /// Same entrant listed twice in the pool
    #[error("Participant listed more than once: {0}")]
    DuplicateParticipant(String),

    /// Rebuild attempted after a result was recorded
    #[error("Bracket {0} already has recorded results")]
    BracketAlreadyInProgress(BracketKey),

    /// Result targets a decided, bye or nonexistent match
    #[error("Invalid match state for round {round}, match {position}: {reason}")]
    InvalidMatchState {
        round: u32,
        position: usize,
        reason: String,
    },

    /// Result targets a match whose slots are still unknown
    #[error("Match {position} of round {round} is not ready: earlier round undecided")]
    MatchNotReady { round: u32, position: usize },

    /// Advance attempted with pending matches left
    #[error("Round {round} is incomplete: {pending} match(es) pending")]
    RoundIncomplete { round: u32, pending: usize },

    /// Concurrent write detected
    #[error("Stale bracket version: expected {expected}, current {actual}")]
    StaleBracketVersion {
        expected: BracketVersion,
        actual: BracketVersion,
    },

    /// No bracket generated for this category
    #[error("Bracket not found: {0}")]
    NotFound(BracketKey),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BracketError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BracketError::InsufficientParticipants { .. } => "insufficient_participants",
            BracketError::DuplicateParticipant(_) => "duplicate_participant",
            BracketError::BracketAlreadyInProgress(_) => "bracket_already_in_progress",
            BracketError::InvalidMatchState { .. } => "invalid_match_state",
            BracketError::MatchNotReady { .. } => "match_not_ready",
            BracketError::RoundIncomplete { .. } => "round_incomplete",
            BracketError::StaleBracketVersion { .. } => "stale_bracket_version",
            BracketError::NotFound(_) => "not_found",
            BracketError::Database(_) => "database",
            BracketError::Serialization(_) => "serialization",
        }
    }

    /// Whether the caller should reread the bracket and retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, BracketError::StaleBracketVersion { .. })
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Database(_) | BracketError::Serialization(_) => {
                "Internal server error".to_string()
            }
            BracketError::NotFound(_) => "Bracket not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
