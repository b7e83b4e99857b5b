//! Round 1 construction: random draw, pairing and byes.

use super::{
    errors::{BracketError, BracketResult},
    models::{Bracket, BracketKey, Participant, Round},
    pairing::pair_entrants,
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::HashSet;

/// Minimum pool size for a bracket
pub const MIN_PARTICIPANTS: usize = 2;

/// Source of the round 1 order
pub trait DrawSource: Send {
    /// Reorder the pool in place
    fn permute(&mut self, participants: &mut [Participant]);
}

impl<D: DrawSource + ?Sized> DrawSource for Box<D> {
    fn permute(&mut self, participants: &mut [Participant]) {
        (**self).permute(participants);
    }
}

/// Uniformly random draw
pub struct RandomDraw<R = StdRng> {
    rng: R,
}

impl<R: Rng + Send> RandomDraw<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDraw<StdRng> {
    /// Reproducible draw for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Draw seeded from the operating system
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl Default for RandomDraw<StdRng> {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl<R: Rng + Send> DrawSource for RandomDraw<R> {
    fn permute(&mut self, participants: &mut [Participant]) {
        participants.shuffle(&mut self.rng);
    }
}

/// Draw made elsewhere (e.g. by hand at the venue), given as an id order.
///
/// Participants missing from the order keep their relative order at the end.
#[derive(Debug, Clone)]
pub struct ScriptedDraw {
    order: Vec<String>,
}

impl ScriptedDraw {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

impl DrawSource for ScriptedDraw {
    fn permute(&mut self, participants: &mut [Participant]) {
        participants.sort_by_key(|participant| {
            self.order
                .iter()
                .position(|id| *id == participant.id)
                .unwrap_or(usize::MAX)
        });
    }
}

/// Builds the first round of a bracket from a participant pool
pub struct BracketBuilder<D = RandomDraw> {
    draw: D,
}

impl<D: DrawSource> BracketBuilder<D> {
    pub fn new(draw: D) -> Self {
        Self { draw }
    }

    /// Validate the pool, permute it and pair it into round 1
    ///
    /// # Errors
    ///
    /// * `BracketError::InsufficientParticipants` - fewer than two entrants
    /// * `BracketError::DuplicateParticipant` - same id listed twice
    pub fn draw(&mut self, mut participants: Vec<Participant>) -> BracketResult<Round> {
        validate_pool(&participants)?;
        self.draw.permute(&mut participants);
        Ok(pair_entrants(1, participants))
    }

    /// Build a fresh bracket holding only round 1
    pub fn build(
        &mut self,
        key: BracketKey,
        participants: Vec<Participant>,
    ) -> BracketResult<Bracket> {
        let entrant_count = participants.len();
        let first_round = self.draw(participants)?;
        Ok(Bracket::new(key, first_round, entrant_count))
    }
}

impl BracketBuilder<RandomDraw> {
    /// Builder with a reproducible random draw
    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomDraw::seeded(seed))
    }
}

impl Default for BracketBuilder<RandomDraw> {
    fn default() -> Self {
        Self::new(RandomDraw::default())
    }
}

/// Check pool size and identifier uniqueness
pub fn validate_pool(participants: &[Participant]) -> BracketResult<()> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(BracketError::InsufficientParticipants {
            needed: MIN_PARTICIPANTS,
            current: participants.len(),
        });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(participant.id.as_str()) {
            return Err(BracketError::DuplicateParticipant(participant.id.clone()));
        }
    }

    Ok(())
}
