//! # Dojo Brackets
//!
//! Single-elimination bracket engine for dojo competitions.
//!
//! Each (event, category) pair owns one bracket. Round 1 is drawn at random
//! from the category's eligible entrants, with a bye for the odd one out.
//! Results are recorded one match at a time, and an operator advances the
//! bracket round by round until a single champion remains.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Bracket model, draw, result recording, progression and the
//!   concurrency-safe [`BracketManager`]
//! - [`store`]: Versioned bracket persistence (in-memory and PostgreSQL)
//! - [`db`]: Connection pooling and registration lookup
//!
//! ## Example
//!
//! ```
//! use dojo_brackets::{Advancement, BracketBuilder, BracketKey, Participant, SlotSide};
//! use dojo_brackets::bracket::{advance, record_result};
//! use uuid::Uuid;
//!
//! let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
//! let mut bracket = BracketBuilder::seeded(7)
//!     .build(key, vec![Participant::new("1", "Ana"), Participant::new("2", "Bia")])
//!     .unwrap();
//!
//! record_result(&mut bracket, 1, 0, SlotSide::A).unwrap();
//! assert!(matches!(advance(&mut bracket).unwrap(), Advancement::Complete { .. }));
//! ```

/// Bracket model and lifecycle operations.
pub mod bracket;
pub use bracket::{
    Advancement, Bracket, BracketBuilder, BracketError, BracketKey, BracketManager,
    BracketResult, BracketVersion, CategoryId, EventId, Match, MatchStatus, Participant, Round,
    Slot, SlotSide,
};

/// Database pool and registration lookup.
pub mod db;
pub use db::{Database, DatabaseConfig, ParticipantSource};

/// Bracket persistence.
pub mod store;
pub use store::{BracketStore, InMemoryBracketStore, PgBracketStore};
