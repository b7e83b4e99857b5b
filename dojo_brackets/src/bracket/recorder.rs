//! Applies a single match outcome to a bracket.

use super::{
    errors::{BracketError, BracketResult},
    models::{Bracket, Match, MatchStatus, SlotSide},
};

/// Record the winner of one match.
///
/// Only the targeted match changes; advancing to the next round is a
/// separate step so results of a round can arrive in any order.
///
/// # Errors
///
/// * `BracketError::MatchNotReady` - the match belongs to a round that has not been
///   reached yet, or one of its slots is still unknown
/// * `BracketError::InvalidMatchState` - the match does not exist, is a bye, is
///   already decided, or the winning slot holds no entrant
pub fn record_result(
    bracket: &mut Bracket,
    round_number: u32,
    position: usize,
    winner: SlotSide,
) -> BracketResult<Match> {
    if round_number as usize > bracket.rounds.len() {
        return Err(unreached_match(bracket, round_number, position));
    }

    let key = bracket.key;

    let target = bracket
        .round_mut(round_number)
        .and_then(|round| round.matches.get_mut(position))
        .ok_or_else(|| invalid_state(round_number, position, "match does not exist"))?;

    if !target.is_ready() {
        return Err(BracketError::MatchNotReady {
            round: round_number,
            position,
        });
    }

    if target.is_bye() {
        return Err(invalid_state(
            round_number,
            position,
            "bye matches are decided automatically",
        ));
    }

    if target.is_decided() {
        return Err(invalid_state(round_number, position, "match already decided"));
    }

    let entrant = target.slot(winner).entrant().cloned().ok_or_else(|| {
        invalid_state(
            round_number,
            position,
            format!("slot {winner} holds no entrant"),
        )
    })?;

    target.winner = Some(entrant);
    target.status = MatchStatus::Decided;

    log::debug!(
        "Recorded result for bracket {} round {} match {}: slot {}",
        key,
        round_number,
        position,
        winner
    );

    Ok(target.clone())
}

/// Error for a round that does not exist yet
fn unreached_match(bracket: &Bracket, round_number: u32, position: usize) -> BracketError {
    let in_tree = bracket
        .projected_rounds()
        .get(round_number as usize - 1)
        .is_some_and(|round| position < round.matches.len());

    if in_tree {
        BracketError::MatchNotReady {
            round: round_number,
            position,
        }
    } else {
        invalid_state(round_number, position, "match does not exist")
    }
}

fn invalid_state(round: u32, position: usize, reason: impl Into<String>) -> BracketError {
    BracketError::InvalidMatchState {
        round,
        position,
        reason: reason.into(),
    }
}
