//! PostgreSQL bracket store.
#![allow(clippy::needless_raw_string_hashes)]

use super::BracketStore;
use crate::bracket::{Bracket, BracketError, BracketKey, BracketResult, BracketVersion, EventId};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::sync::Arc;

/// Default PostgreSQL implementation of `BracketStore`.
///
/// Expects the `event_brackets` table from `migrations/0001_event_brackets.sql`.
#[derive(Clone)]
pub struct PgBracketStore {
    pool: Arc<PgPool>,
}

impl PgBracketStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Stored version of a bracket, 0 when absent
    async fn current_version(&self, key: BracketKey) -> BracketResult<BracketVersion> {
        let row = sqlx::query(
            "SELECT version FROM event_brackets WHERE event_id = $1 AND category_id = $2",
        )
        .bind(key.event_id)
        .bind(key.category_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map_or(0, |row| row.get::<i64, _>("version") as BracketVersion))
    }

    fn decode(row: &PgRow) -> BracketResult<Bracket> {
        let document: serde_json::Value = row.get("document");
        let mut bracket: Bracket = serde_json::from_value(document)?;
        // The column is authoritative; the document copy may lag behind
        bracket.version = row.get::<i64, _>("version") as BracketVersion;
        Ok(bracket)
    }
}

#[async_trait]
impl BracketStore for PgBracketStore {
    async fn load(&self, key: BracketKey) -> BracketResult<Option<Bracket>> {
        let row = sqlx::query(
            r#"
            SELECT version, document
            FROM event_brackets
            WHERE event_id = $1 AND category_id = $2
            "#,
        )
        .bind(key.event_id)
        .bind(key.category_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn save(
        &self,
        bracket: &Bracket,
        expected_version: Option<BracketVersion>,
    ) -> BracketResult<()> {
        let document = serde_json::to_value(bracket)?;
        let key = bracket.key;

        let result = match expected_version {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO event_brackets (event_id, category_id, version, document)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (event_id, category_id) DO NOTHING
                    "#,
                )
                .bind(key.event_id)
                .bind(key.category_id)
                .bind(bracket.version as i64)
                .bind(&document)
                .execute(self.pool.as_ref())
                .await?
            }
            Some(expected) => {
                sqlx::query(
                    r#"
                    UPDATE event_brackets
                    SET version = $3, document = $4, updated_at = NOW()
                    WHERE event_id = $1 AND category_id = $2 AND version = $5
                    "#,
                )
                .bind(key.event_id)
                .bind(key.category_id)
                .bind(bracket.version as i64)
                .bind(&document)
                .bind(expected as i64)
                .execute(self.pool.as_ref())
                .await?
            }
        };

        if result.rows_affected() == 0 {
            let actual = self.current_version(key).await?;
            log::warn!(
                "Rejected stale write to bracket {}: expected version {:?}, found {}",
                key,
                expected_version,
                actual
            );
            return Err(BracketError::StaleBracketVersion {
                expected: expected_version.unwrap_or(0),
                actual,
            });
        }

        Ok(())
    }

    async fn list_for_event(&self, event_id: EventId) -> BracketResult<Vec<Bracket>> {
        let rows = sqlx::query(
            r#"
            SELECT version, document
            FROM event_brackets
            WHERE event_id = $1
            ORDER BY created_at, category_id
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(Self::decode).collect()
    }

    async fn delete(&self, key: BracketKey) -> BracketResult<bool> {
        let result =
            sqlx::query("DELETE FROM event_brackets WHERE event_id = $1 AND category_id = $2")
                .bind(key.event_id)
                .bind(key.category_id)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
