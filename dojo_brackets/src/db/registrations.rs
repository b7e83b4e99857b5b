//! Registration lookup: which students may enter a category's bracket.
#![allow(clippy::needless_raw_string_hashes)]

use crate::bracket::{BracketKey, BracketResult, Participant};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait resolving the eligible entrants of an event category
#[async_trait]
pub trait ParticipantSource: Send + Sync {
    /// Entrants eligible for the bracket of `key`, in registration order
    async fn eligible_participants(&self, key: BracketKey) -> BracketResult<Vec<Participant>>;
}

/// PostgreSQL registration lookup.
///
/// Reads the `event_registrations` and `students` tables owned by the
/// registration service. Only paid registrations are eligible.
#[derive(Clone)]
pub struct PgRegistrationRepository {
    pool: Arc<PgPool>,
}

impl PgRegistrationRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantSource for PgRegistrationRepository {
    async fn eligible_participants(&self, key: BracketKey) -> BracketResult<Vec<Participant>> {
        let rows = sqlx::query(
            r#"
            SELECT r.student_id, s.name
            FROM event_registrations r
            JOIN students s ON s.id = r.student_id
            WHERE r.event_id = $1 AND r.category_id = $2 AND r.paid = TRUE
            ORDER BY r.registered_at, r.student_id
            "#,
        )
        .bind(key.event_id)
        .bind(key.category_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let participants = rows
            .iter()
            .map(|row| {
                let student_id: Uuid = row.get("student_id");
                let name: String = row.get("name");
                Participant::new(student_id.to_string(), name)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Resolved {} eligible entrants for bracket {}",
            participants.len(),
            key
        );

        Ok(participants)
    }
}

/// Fixed registration lists, for tests and database-less deployments
#[derive(Clone, Default)]
pub struct StaticParticipantSource {
    entries: Arc<RwLock<HashMap<BracketKey, Vec<Participant>>>>,
}

impl StaticParticipantSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entrants registered for `key`
    pub async fn insert(&self, key: BracketKey, participants: Vec<Participant>) {
        self.entries.write().await.insert(key, participants);
    }
}

#[async_trait]
impl ParticipantSource for StaticParticipantSource {
    async fn eligible_participants(&self, key: BracketKey) -> BracketResult<Vec<Participant>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}
