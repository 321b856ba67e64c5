//! Repository for the `votes` table.

use sqlx::{PgConnection, PgPool};
use showcase_core::types::{DbId, Timestamp};

use crate::models::vote::Vote;

/// Provides append and sweep operations for vote records.
pub struct VoteRepo;

impl VoteRepo {
    /// Most recent vote for `entry_id` cast strictly after `cutoff`, if any.
    pub async fn latest_after(
        conn: &mut PgConnection,
        entry_id: DbId,
        cutoff: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let (latest,): (Option<Timestamp>,) = sqlx::query_as(
            "SELECT max(cast_at) FROM votes WHERE entry_id = $1 AND cast_at > $2",
        )
        .bind(entry_id)
        .bind(cutoff)
        .fetch_one(&mut *conn)
        .await?;
        Ok(latest)
    }

    /// Append a vote record.
    pub async fn insert(
        conn: &mut PgConnection,
        entry_id: DbId,
        cast_at: Timestamp,
    ) -> Result<Vote, sqlx::Error> {
        sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (entry_id, cast_at) VALUES ($1, $2)
             RETURNING id, entry_id, cast_at",
        )
        .bind(entry_id)
        .bind(cast_at)
        .fetch_one(&mut *conn)
        .await
    }

    /// List the votes of an entry, newest first.
    pub async fn list_by_entry(pool: &PgPool, entry_id: DbId) -> Result<Vec<Vote>, sqlx::Error> {
        sqlx::query_as::<_, Vote>(
            "SELECT id, entry_id, cast_at FROM votes
             WHERE entry_id = $1
             ORDER BY cast_at DESC",
        )
        .bind(entry_id)
        .fetch_all(pool)
        .await
    }

    /// Delete votes cast at or before `cutoff`. Returns the number of rows removed.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM votes WHERE cast_at <= $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
