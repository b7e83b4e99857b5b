//! Bracket data models for single-elimination competitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event ID type
pub type EventId = Uuid;

/// Category ID type (weight class, belt division, age group...)
pub type CategoryId = Uuid;

/// Optimistic concurrency counter carried by every persisted bracket
pub type BracketVersion = u64;

/// Identifies one bracket: a category inside an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BracketKey {
    pub event_id: EventId,
    pub category_id: CategoryId,
}

impl BracketKey {
    pub fn new(event_id: EventId, category_id: CategoryId) -> Self {
        Self {
            event_id,
            category_id,
        }
    }
}

impl fmt::Display for BracketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_id, self.category_id)
    }
}

/// One entrant of a category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque identifier supplied by the eligibility resolver
    pub id: String,
    /// Display label (usually the student name)
    pub label: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Occupant of one side of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "participant", rename_all = "snake_case")]
pub enum Slot {
    /// A real entrant
    Entrant(Participant),
    /// No opponent, the other side advances without fighting
    Bye,
    /// Not known yet, depends on an undecided earlier match
    Tbd,
}

impl Slot {
    /// Entrant in this slot, if any
    pub fn entrant(&self) -> Option<&Participant> {
        match self {
            Slot::Entrant(participant) => Some(participant),
            Slot::Bye | Slot::Tbd => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    pub fn is_tbd(&self) -> bool {
        matches!(self, Slot::Tbd)
    }
}

/// Side of a match, used to name the winner of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSide {
    A,
    B,
}

impl fmt::Display for SlotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSide::A => write!(f, "a"),
            SlotSide::B => write!(f, "b"),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Waiting for a result
    Pending,
    /// Winner known
    Decided,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Decided => write!(f, "decided"),
        }
    }
}

/// A single fight between two slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Position inside the round; fixes where the winner lands next round
    pub position: usize,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub winner: Option<Participant>,
    pub status: MatchStatus,
}

impl Match {
    /// Two entrants facing each other, waiting for a result
    pub fn paired(position: usize, a: Participant, b: Participant) -> Self {
        Self {
            position,
            slot_a: Slot::Entrant(a),
            slot_b: Slot::Entrant(b),
            winner: None,
            status: MatchStatus::Pending,
        }
    }

    /// Unpaired entrant, decided on creation
    pub fn bye(position: usize, entrant: Participant) -> Self {
        Self {
            position,
            slot_a: Slot::Entrant(entrant.clone()),
            slot_b: Slot::Bye,
            winner: Some(entrant),
            status: MatchStatus::Decided,
        }
    }

    /// Match of a round that does not exist yet.
    ///
    /// Always pending with no winner, even against a `Bye`: the entrant who
    /// will hold the bye is unknown until the round is created by
    /// [`progression::advance`](super::progression::advance), which then
    /// decides it on creation.
    pub fn placeholder(position: usize, slot_b: Slot) -> Self {
        Self {
            position,
            slot_a: Slot::Tbd,
            slot_b,
            winner: None,
            status: MatchStatus::Pending,
        }
    }

    /// Occupant of the given side
    pub fn slot(&self, side: SlotSide) -> &Slot {
        match side {
            SlotSide::A => &self.slot_a,
            SlotSide::B => &self.slot_b,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.slot_a.is_bye() || self.slot_b.is_bye()
    }

    pub fn is_decided(&self) -> bool {
        self.status == MatchStatus::Decided
    }

    /// Both sides known
    pub fn is_ready(&self) -> bool {
        !self.slot_a.is_tbd() && !self.slot_b.is_tbd()
    }

    /// Decided by an operator rather than by a bye
    pub fn has_recorded_result(&self) -> bool {
        self.is_decided() && !self.is_bye()
    }
}

/// One round of the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Round number (1-indexed)
    pub number: u32,
    /// Matches in bracket-tree order
    pub matches: Vec<Match>,
}

impl Round {
    pub fn is_decided(&self) -> bool {
        self.matches.iter().all(Match::is_decided)
    }

    pub fn pending_count(&self) -> usize {
        self.matches.iter().filter(|m| !m.is_decided()).count()
    }

    pub fn bye_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_bye()).count()
    }

    /// Number of real entrants placed in this round
    pub fn entrant_count(&self) -> usize {
        self.matches
            .iter()
            .map(|m| {
                usize::from(m.slot_a.entrant().is_some()) + usize::from(m.slot_b.entrant().is_some())
            })
            .sum()
    }

    /// Winners in match-position order
    pub fn winners(&self) -> Vec<Participant> {
        self.matches
            .iter()
            .filter_map(|m| m.winner.clone())
            .collect()
    }
}

/// Persisted bracket of one event category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub key: BracketKey,
    /// Bumped on every persisted write
    pub version: BracketVersion,
    /// Size of the participant pool round 1 was drawn from
    pub entrant_count: usize,
    /// Append-only; index 0 is round 1
    pub rounds: Vec<Round>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bracket {
    /// Create a bracket holding its first round
    pub fn new(key: BracketKey, first_round: Round, entrant_count: usize) -> Self {
        let now = Utc::now();
        Self {
            key,
            version: 1,
            entrant_count,
            rounds: vec![first_round],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn latest_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Get round by number (1-indexed)
    pub fn round(&self, number: u32) -> Option<&Round> {
        if number == 0 {
            return None;
        }
        self.rounds.get(number as usize - 1)
    }

    pub(crate) fn round_mut(&mut self, number: u32) -> Option<&mut Round> {
        if number == 0 {
            return None;
        }
        self.rounds.get_mut(number as usize - 1)
    }

    /// Latest round is a single decided match
    pub fn is_complete(&self) -> bool {
        self.latest_round()
            .is_some_and(|round| round.matches.len() == 1 && round.is_decided())
    }

    pub fn champion(&self) -> Option<&Participant> {
        if !self.is_complete() {
            return None;
        }
        self.latest_round()
            .and_then(|round| round.matches.first())
            .and_then(|m| m.winner.as_ref())
    }

    /// Whether any match was decided by an operator (byes don't count)
    pub fn has_recorded_results(&self) -> bool {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter())
            .any(Match::has_recorded_result)
    }

    /// Pending matches of the latest round
    pub fn pending_matches(&self) -> impl Iterator<Item = &Match> {
        self.latest_round()
            .into_iter()
            .flat_map(|round| round.matches.iter())
            .filter(|m| !m.is_decided())
    }

    /// Number of rounds needed to crown a champion
    pub fn total_rounds(&self) -> u32 {
        total_rounds_for(self.entrant_count)
    }

    /// Existing rounds followed by placeholder rounds down to the final.
    ///
    /// Placeholder matches have `Tbd` slots; an odd number of future
    /// entrants shows up as a trailing `Tbd` vs `Bye` match. Every
    /// placeholder is `Pending` without a winner, so only played rounds
    /// report decided matches or byes with an occupant.
    pub fn projected_rounds(&self) -> Vec<Round> {
        let mut rounds = self.rounds.clone();
        let mut alive = self
            .latest_round()
            .map_or(self.entrant_count, |round| round.matches.len());
        let mut number = rounds.len() as u32;

        while alive > 1 {
            number += 1;
            let paired = alive / 2;
            let mut matches: Vec<Match> = (0..paired)
                .map(|position| Match::placeholder(position, Slot::Tbd))
                .collect();
            if alive % 2 == 1 {
                matches.push(Match::placeholder(paired, Slot::Bye));
            }
            alive = matches.len();
            rounds.push(Round { number, matches });
        }

        rounds
    }

    /// Record a write: bump the version and timestamp
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Rounds a pool of `entrants` needs until one remains (`ceil(log2 n)`)
pub fn total_rounds_for(entrants: usize) -> u32 {
    let mut alive = entrants;
    let mut rounds = 0;
    while alive > 1 {
        alive = alive.div_ceil(2);
        rounds += 1;
    }
    rounds
}

/// Outcome of asking the progression engine to move on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advancement {
    /// A new round was appended
    NextRound { round: u32, matches: usize },
    /// Final already decided; nothing was changed
    Complete { champion: Participant },
}
