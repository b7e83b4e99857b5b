//! Bracket module for single-elimination competition keys.
//!
//! This module provides:
//! - Round 1 draw with byes for odd pools
//! - Result recording, one match at a time
//! - Explicit round-over-round advancement until a champion remains
//! - A manager serialising writers per event category
//!
//! ## Example
//!
//! ```no_run
//! use dojo_brackets::bracket::{BracketKey, BracketManager, Participant, SlotSide};
//! use dojo_brackets::store::InMemoryBracketStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = BracketManager::new(Arc::new(InMemoryBracketStore::new()));
//!     let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
//!
//!     let pool = vec![
//!         Participant::new("1", "Alice"),
//!         Participant::new("2", "Bob"),
//!         Participant::new("3", "Carol"),
//!     ];
//!     let bracket = manager.generate(key, pool, None).await?;
//!     println!("Round 1 has {} matches", bracket.rounds[0].matches.len());
//!
//!     manager.record_result(key, 1, 0, SlotSide::A, None).await?;
//!     let (outcome, _) = manager.advance(key, None).await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod errors;
pub mod manager;
pub mod models;
pub mod pairing;
pub mod progression;
pub mod recorder;

pub use builder::{BracketBuilder, DrawSource, MIN_PARTICIPANTS, RandomDraw, ScriptedDraw};
pub use errors::{BracketError, BracketResult};
pub use manager::BracketManager;
pub use models::{
    Advancement, Bracket, BracketKey, BracketVersion, CategoryId, EventId, Match, MatchStatus,
    Participant, Round, Slot, SlotSide, total_rounds_for,
};
pub use progression::advance;
pub use recorder::record_result;
