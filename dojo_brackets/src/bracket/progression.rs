//! Round-over-round progression of a bracket.

use super::{
    errors::{BracketError, BracketResult},
    models::{Advancement, Bracket, Participant},
    pairing::pair_entrants,
};

/// Move the bracket forward once its latest round is fully decided.
///
/// Winners are paired in match-position order, so the tree keeps its shape
/// and the same decided state always yields the same next round. Once the
/// final is decided this reports the champion and leaves the bracket alone.
///
/// # Errors
///
/// * `BracketError::RoundIncomplete` - the latest round still has pending matches
pub fn advance(bracket: &mut Bracket) -> BracketResult<Advancement> {
    let latest = bracket
        .latest_round()
        .ok_or(BracketError::NotFound(bracket.key))?;

    if !latest.is_decided() {
        return Err(BracketError::RoundIncomplete {
            round: latest.number,
            pending: latest.pending_count(),
        });
    }

    let winners = round_winners(bracket)?;

    if let [champion] = winners.as_slice() {
        return Ok(Advancement::Complete {
            champion: champion.clone(),
        });
    }

    let next_number = latest.number + 1;
    let next_round = pair_entrants(next_number, winners);
    let matches = next_round.matches.len();
    bracket.rounds.push(next_round);

    log::info!(
        "Bracket {} advanced to round {} ({} matches)",
        bracket.key,
        next_number,
        matches
    );

    Ok(Advancement::NextRound {
        round: next_number,
        matches,
    })
}

/// Winners of the latest round in position order
fn round_winners(bracket: &Bracket) -> BracketResult<Vec<Participant>> {
    let Some(latest) = bracket.latest_round() else {
        return Err(BracketError::NotFound(bracket.key));
    };

    latest
        .matches
        .iter()
        .map(|m| {
            m.winner
                .clone()
                .ok_or_else(|| BracketError::InvalidMatchState {
                    round: latest.number,
                    position: m.position,
                    reason: "decided match has no winner".to_string(),
                })
        })
        .collect()
}
