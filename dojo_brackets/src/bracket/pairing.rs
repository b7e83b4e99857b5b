//! Pairing rule shared by round 1 and every later round.

use super::models::{Match, Participant, Round};

/// Pair entrants in order: `(0,1), (2,3), ...`.
///
/// An odd trailing entrant gets a bye match that is already decided.
pub fn pair_entrants(round_number: u32, entrants: Vec<Participant>) -> Round {
    let mut matches = Vec::with_capacity(entrants.len().div_ceil(2));
    let mut entrants = entrants.into_iter();

    while let Some(a) = entrants.next() {
        let position = matches.len();
        match entrants.next() {
            Some(b) => matches.push(Match::paired(position, a, b)),
            None => matches.push(Match::bye(position, a)),
        }
    }

    Round {
        number: round_number,
        matches,
    }
}
