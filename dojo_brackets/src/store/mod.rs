//! Bracket persistence.
//!
//! Brackets are stored as one document per (event, category) next to a
//! version counter. Every write is a compare-and-swap on that counter so a
//! writer holding an old snapshot is rejected instead of overwriting newer
//! state.

use crate::bracket::{Bracket, BracketKey, BracketResult, BracketVersion, EventId};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryBracketStore;
pub use postgres::PgBracketStore;

/// Trait for bracket repository operations
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// Load the current snapshot of a bracket
    async fn load(&self, key: BracketKey) -> BracketResult<Option<Bracket>>;

    /// Persist `bracket` if the stored version still equals `expected_version`.
    ///
    /// `None` means the bracket must not exist yet.
    ///
    /// # Errors
    ///
    /// * `BracketError::StaleBracketVersion` - someone else wrote first
    async fn save(
        &self,
        bracket: &Bracket,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<()>;

    /// All brackets of one event, ordered by creation
    async fn list_for_event(&self, event_id: EventId) -> BracketResult<Vec<Bracket>>;

    /// Remove a bracket (administrative reset). Returns whether one existed.
    async fn delete(&self, key: BracketKey) -> BracketResult<bool>;
}
