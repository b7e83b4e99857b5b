//! In-process bracket store.

use super::BracketStore;
use crate::bracket::{Bracket, BracketError, BracketKey, BracketResult, BracketVersion, EventId};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Bracket store kept in memory; used by tests and database-less deployments
#[derive(Clone, Default)]
pub struct InMemoryBracketStore {
    brackets: Arc<RwLock<HashMap<BracketKey, Bracket>>>,
}

impl InMemoryBracketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored brackets
    pub async fn len(&self) -> usize {
        self.brackets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.brackets.read().await.is_empty()
    }
}

#[async_trait]
impl BracketStore for InMemoryBracketStore {
    async fn load(&self, key: BracketKey) -> BracketResult<Option<Bracket>> {
        Ok(self.brackets.read().await.get(&key).cloned())
    }

    async fn save(
        &self,
        bracket: &Bracket,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<()> {
        // Check and write under one lock so concurrent saves can't both pass
        let mut brackets = self.brackets.write().await;
        let actual = brackets.get(&bracket.key).map(|stored| stored.version);

        if actual != expected_version {
            return Err(BracketError::StaleBracketVersion {
                expected: expected_version.unwrap_or(0),
                actual: actual.unwrap_or(0),
            });
        }

        brackets.insert(bracket.key, bracket.clone());
        Ok(())
    }

    async fn list_for_event(&self, event_id: EventId) -> BracketResult<Vec<Bracket>> {
        let brackets = self.brackets.read().await;
        let mut found: Vec<Bracket> = brackets
            .values()
            .filter(|bracket| bracket.key.event_id == event_id)
            .cloned()
            .collect();
        found.sort_by_key(|bracket| (bracket.created_at, bracket.key.category_id));
        Ok(found)
    }

    async fn delete(&self, key: BracketKey) -> BracketResult<bool> {
        Ok(self.brackets.write().await.remove(&key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketBuilder, Participant};
    use uuid::Uuid;

    fn bracket_for(key: BracketKey) -> Bracket {
        BracketBuilder::seeded(1)
            .build(
                key,
                vec![Participant::new("a", "Ana"), Participant::new("b", "Bia")],
            )
            .expect("valid pool")
    }

    #[tokio::test]
    async fn test_insert_then_load() {
        let store = InMemoryBracketStore::new();
        let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
        let bracket = bracket_for(key);

        store.save(&bracket, None).await.expect("fresh insert");
        let loaded = store.load(key).await.expect("load").expect("stored");
        assert_eq!(loaded, bracket);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_twice_is_stale() {
        let store = InMemoryBracketStore::new();
        let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
        let bracket = bracket_for(key);

        store.save(&bracket, None).await.expect("fresh insert");
        let err = store.save(&bracket, None).await.unwrap_err();
        assert!(matches!(
            err,
            BracketError::StaleBracketVersion {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_update_requires_matching_version() {
        let store = InMemoryBracketStore::new();
        let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
        let mut bracket = bracket_for(key);
        store.save(&bracket, None).await.expect("fresh insert");

        bracket.version = 2;
        let err = store.save(&bracket, Some(5)).await.unwrap_err();
        assert!(matches!(
            err,
            BracketError::StaleBracketVersion {
                expected: 5,
                actual: 1
            }
        ));

        store.save(&bracket, Some(1)).await.expect("matching version");
        let loaded = store.load(key).await.expect("load").expect("stored");
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = InMemoryBracketStore::new();
        let event_id = Uuid::new_v4();
        let first = BracketKey::new(event_id, Uuid::new_v4());
        let second = BracketKey::new(event_id, Uuid::new_v4());
        let other = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());

        for key in [first, second, other] {
            store.save(&bracket_for(key), None).await.expect("insert");
        }

        let listed = store.list_for_event(event_id).await.expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|b| b.key.event_id == event_id));

        assert!(store.delete(first).await.expect("delete"));
        assert!(!store.delete(first).await.expect("delete"));
        assert!(store.load(first).await.expect("load").is_none());
        assert!(!store.is_empty().await);
    }
}
