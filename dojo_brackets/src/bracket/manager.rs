//! Bracket manager: serialised, versioned access to stored brackets.

use super::{
    builder::{BracketBuilder, DrawSource, RandomDraw, validate_pool},
    errors::{BracketError, BracketResult},
    models::{Advancement, Bracket, BracketKey, BracketVersion, EventId, Match, Participant, SlotSide},
    progression, recorder,
};
use crate::store::BracketStore;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Bracket manager
///
/// Writers of the same bracket are serialised through a per-key lock, and
/// every write is saved with a compare-and-swap on the bracket version so
/// that managers in other processes sharing the store can't lose updates.
#[derive(Clone)]
pub struct BracketManager {
    /// Bracket persistence
    store: Arc<dyn BracketStore>,

    /// Round 1 builder with the shared draw source
    builder: Arc<Mutex<BracketBuilder<Box<dyn DrawSource>>>>,

    /// One writer lock per bracket
    locks: Arc<RwLock<HashMap<BracketKey, Arc<Mutex<()>>>>>,
}

impl BracketManager {
    /// Create a manager drawing round 1 from OS-seeded randomness
    pub fn new(store: Arc<dyn BracketStore>) -> Self {
        Self::with_draw(store, RandomDraw::from_os_rng())
    }

    /// Create a manager with reproducible draws
    pub fn with_seed(store: Arc<dyn BracketStore>, seed: u64) -> Self {
        Self::with_draw(store, RandomDraw::seeded(seed))
    }

    /// Create a manager with any draw source
    pub fn with_draw(store: Arc<dyn BracketStore>, draw: impl DrawSource + 'static) -> Self {
        let draw: Box<dyn DrawSource> = Box::new(draw);
        Self {
            store,
            builder: Arc::new(Mutex::new(BracketBuilder::new(draw))),
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Acquire the writer lock of one bracket
    async fn lock_key(&self, key: BracketKey) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(&key).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => self.locks.write().await.entry(key).or_default().clone(),
        };
        lock.lock_owned().await
    }

    /// Release the writer lock, dropping its entry when nobody else holds
    /// or waits on it
    async fn unlock_key(&self, key: BracketKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.write().await;
        if locks
            .get(&key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&key);
        }
    }

    /// Number of brackets with a live writer lock entry
    #[cfg(test)]
    pub(crate) async fn tracked_locks(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Generate (or redraw) the bracket of a category
    ///
    /// # Arguments
    ///
    /// * `key` - Event and category
    /// * `participants` - Eligible entrants
    /// * `expected_version` - Version the caller last read, if any
    ///
    /// # Errors
    ///
    /// * `BracketError::InsufficientParticipants` - fewer than two entrants
    /// * `BracketError::BracketAlreadyInProgress` - a result was already recorded
    /// * `BracketError::StaleBracketVersion` - concurrent write
    pub async fn generate(
        &self,
        key: BracketKey,
        participants: Vec<Participant>,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<Bracket> {
        validate_pool(&participants)?;

        let guard = self.lock_key(key).await;
        let result = self
            .generate_locked(key, participants, expected_version)
            .await;
        self.unlock_key(key, guard).await;
        result
    }

    async fn generate_locked(
        &self,
        key: BracketKey,
        participants: Vec<Participant>,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<Bracket> {
        let existing = self.store.load(key).await?;
        check_expected_version(existing.as_ref(), expected_version)?;

        if existing
            .as_ref()
            .is_some_and(Bracket::has_recorded_results)
        {
            return Err(BracketError::BracketAlreadyInProgress(key));
        }

        let mut bracket = self.builder.lock().await.build(key, participants)?;

        let previous_version = existing.as_ref().map(|current| current.version);
        if let Some(current) = &existing {
            bracket.version = current.version + 1;
            bracket.created_at = current.created_at;
        }

        self.store.save(&bracket, previous_version).await?;

        if existing.is_some() {
            log::info!(
                "Redrew bracket {} with {} entrants (version {})",
                key,
                bracket.entrant_count,
                bracket.version
            );
        } else {
            log::info!(
                "Generated bracket {} with {} entrants",
                key,
                bracket.entrant_count
            );
        }

        Ok(bracket)
    }

    /// Record the winner of a match
    ///
    /// # Returns
    ///
    /// * `BracketResult<(Match, Bracket)>` - The decided match and the saved bracket
    pub async fn record_result(
        &self,
        key: BracketKey,
        round: u32,
        position: usize,
        winner: SlotSide,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<(Match, Bracket)> {
        let guard = self.lock_key(key).await;
        let result = self
            .record_result_locked(key, round, position, winner, expected_version)
            .await;
        self.unlock_key(key, guard).await;
        result
    }

    async fn record_result_locked(
        &self,
        key: BracketKey,
        round: u32,
        position: usize,
        winner: SlotSide,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<(Match, Bracket)> {
        let mut bracket = self.load_existing(key).await?;
        check_expected_version(Some(&bracket), expected_version)?;

        let previous_version = bracket.version;
        let decided = recorder::record_result(&mut bracket, round, position, winner)?;
        bracket.touch();
        self.store.save(&bracket, Some(previous_version)).await?;

        Ok((decided, bracket))
    }

    /// Advance to the next round, or report the champion
    ///
    /// # Returns
    ///
    /// * `BracketResult<(Advancement, Bracket)>` - Outcome and the current bracket
    pub async fn advance(
        &self,
        key: BracketKey,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<(Advancement, Bracket)> {
        let guard = self.lock_key(key).await;
        let result = self.advance_locked(key, expected_version).await;
        self.unlock_key(key, guard).await;
        result
    }

    async fn advance_locked(
        &self,
        key: BracketKey,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<(Advancement, Bracket)> {
        let mut bracket = self.load_existing(key).await?;
        check_expected_version(Some(&bracket), expected_version)?;

        let previous_version = bracket.version;
        let outcome = progression::advance(&mut bracket)?;

        match &outcome {
            Advancement::NextRound { .. } => {
                bracket.touch();
                self.store.save(&bracket, Some(previous_version)).await?;
            }
            Advancement::Complete { champion } => {
                log::debug!("Bracket {} complete, champion {}", key, champion.id);
            }
        }

        Ok((outcome, bracket))
    }

    /// Current snapshot of a bracket, if generated
    pub async fn get(&self, key: BracketKey) -> BracketResult<Option<Bracket>> {
        self.store.load(key).await
    }

    /// All brackets of an event
    pub async fn list_for_event(&self, event_id: EventId) -> BracketResult<Vec<Bracket>> {
        self.store.list_for_event(event_id).await
    }

    async fn load_existing(&self, key: BracketKey) -> BracketResult<Bracket> {
        self.store
            .load(key)
            .await?
            .ok_or(BracketError::NotFound(key))
    }
}

/// Reject callers that acted on an older snapshot
fn check_expected_version(
    current: Option<&Bracket>,
    expected: Option<BracketVersion>,
) -> BracketResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = current.map_or(0, |bracket| bracket.version);
    if actual != expected {
        return Err(BracketError::StaleBracketVersion { expected, actual });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bracket::builder::ScriptedDraw, store::InMemoryBracketStore};
    use uuid::Uuid;

    fn p(name: &str) -> Participant {
        Participant::new(name.to_lowercase(), name)
    }

    fn key() -> BracketKey {
        BracketKey::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn manager() -> BracketManager {
        BracketManager::with_seed(Arc::new(InMemoryBracketStore::new()), 17)
    }

    #[tokio::test]
    async fn test_generate_persists_round_one() {
        let manager = manager();
        let key = key();
        let bracket = manager
            .generate(key, vec![p("Alice"), p("Bob"), p("Carol")], None)
            .await
            .expect("valid pool");

        assert_eq!(bracket.version, 1);
        assert_eq!(bracket.rounds[0].matches.len(), 2);

        let stored = manager.get(key).await.expect("load").expect("stored");
        assert_eq!(stored, bracket);
    }

    #[tokio::test]
    async fn test_generate_rejects_small_pool_without_writing() {
        let manager = manager();
        let key = key();
        let err = manager
            .generate(key, vec![p("Alice")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::InsufficientParticipants { .. }));
        assert!(manager.get(key).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_redraw_bumps_version_until_results_exist() {
        let manager = manager();
        let key = key();
        let pool = vec![p("Alice"), p("Bob"), p("Carol"), p("Dan")];

        let first = manager.generate(key, pool.clone(), None).await.expect("draw");
        let second = manager.generate(key, pool.clone(), None).await.expect("redraw");
        assert_eq!(second.version, first.version + 1);
        assert_eq!(second.created_at, first.created_at);

        manager
            .record_result(key, 1, 0, SlotSide::A, None)
            .await
            .expect("pending match");

        let err = manager.generate(key, pool, None).await.unwrap_err();
        assert!(matches!(err, BracketError::BracketAlreadyInProgress(k) if k == key));
    }

    #[tokio::test]
    async fn test_odd_pool_redraw_ignores_bye() {
        let manager = manager();
        let key = key();
        let pool = vec![p("Alice"), p("Bob"), p("Carol")];

        manager.generate(key, pool.clone(), None).await.expect("draw");
        manager
            .generate(key, pool, None)
            .await
            .expect("bye alone does not lock the bracket");
    }

    #[tokio::test]
    async fn test_stale_expected_version_rejected() {
        let manager = manager();
        let key = key();
        let bracket = manager
            .generate(key, vec![p("Alice"), p("Bob")], None)
            .await
            .expect("draw");

        manager
            .record_result(key, 1, 0, SlotSide::A, Some(bracket.version))
            .await
            .expect("current version");

        let err = manager
            .advance(key, Some(bracket.version))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BracketError::StaleBracketVersion {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_bracket_not_found() {
        let manager = manager();
        let key = key();
        let err = manager.advance(key, None).await.unwrap_err();
        assert!(matches!(err, BracketError::NotFound(k) if k == key));

        let err = manager
            .record_result(key, 1, 0, SlotSide::A, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_advance_does_not_write() {
        let manager = BracketManager::with_draw(
            Arc::new(InMemoryBracketStore::new()),
            ScriptedDraw::new(["alice", "bob"]),
        );
        let key = key();
        manager
            .generate(key, vec![p("Alice"), p("Bob")], None)
            .await
            .expect("draw");
        let (_, recorded) = manager
            .record_result(key, 1, 0, SlotSide::B, None)
            .await
            .expect("pending match");

        let (first, after_first) = manager.advance(key, None).await.expect("complete");
        let (second, after_second) = manager.advance(key, None).await.expect("complete");

        assert_eq!(first, Advancement::Complete { champion: p("Bob") });
        assert_eq!(first, second);
        assert_eq!(after_first.version, recorded.version);
        assert_eq!(after_second, after_first);
    }

    #[tokio::test]
    async fn test_writer_locks_released_after_writes() {
        let manager = manager();
        let pool = vec![p("Alice"), p("Bob"), p("Carol"), p("Dan")];

        let key = key();
        manager.generate(key, pool.clone(), None).await.expect("draw");
        manager
            .record_result(key, 1, 0, SlotSide::A, None)
            .await
            .expect("pending match");
        manager.advance(key, None).await.unwrap_err();
        assert_eq!(manager.tracked_locks().await, 0);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
                manager.generate(key, pool.clone(), None).await.expect("draw");
                manager.generate(key, pool, None).await.expect("redraw");
            }));
        }
        let shared = manager.clone();
        tasks.push(tokio::spawn(async move {
            shared
                .record_result(key, 1, 1, SlotSide::B, None)
                .await
                .expect("pending match");
        }));
        for task in tasks {
            task.await.expect("task");
        }

        assert_eq!(manager.tracked_locks().await, 0);
    }
}
