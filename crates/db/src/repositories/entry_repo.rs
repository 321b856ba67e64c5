//! Repository for the `entries` table.

use sqlx::{PgConnection, PgPool};
use showcase_core::listing::{like_pattern, PageWindow};
use showcase_core::types::{DbId, Timestamp};

use crate::models::entry::{CreateEntry, EntryPhoto, EntrySummary};

/// Column list for [`EntrySummary`]; never includes the photo payload.
const SUMMARY_COLUMNS: &str = "id, full_name, country, city, description, photo_content_type, \
    octet_length(photo_bytes) AS photo_size, score, created_at, updated_at";

/// Gallery ordering, with `id` as the final deterministic tie-break.
const RANKING: &str = "score DESC, created_at DESC, id DESC";

/// Provides queries over gallery entries.
pub struct EntryRepo;

impl EntryRepo {
    /// Insert a new entry with a zero score, returning its summary.
    pub async fn create(pool: &PgPool, input: &CreateEntry) -> Result<EntrySummary, sqlx::Error> {
        let query = format!(
            "INSERT INTO entries
                (full_name, country, city, description, photo_bytes, photo_content_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SUMMARY_COLUMNS}"
        );
        sqlx::query_as::<_, EntrySummary>(&query)
            .bind(&input.full_name)
            .bind(&input.country)
            .bind(&input.city)
            .bind(&input.description)
            .bind(&input.photo_bytes)
            .bind(&input.photo_content_type)
            .fetch_one(pool)
            .await
    }

    /// Find an entry summary by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EntrySummary>, sqlx::Error> {
        let query = format!("SELECT {SUMMARY_COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, EntrySummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load the photo payload of an entry.
    pub async fn find_photo(pool: &PgPool, id: DbId) -> Result<Option<EntryPhoto>, sqlx::Error> {
        sqlx::query_as::<_, EntryPhoto>(
            "SELECT id, photo_bytes, photo_content_type, updated_at FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List entries by score, newest first among equal scores.
    ///
    /// A non-blank `search` keeps only entries whose name, country, city or
    /// description contains it, ignoring case.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        window: PageWindow,
    ) -> Result<Vec<EntrySummary>, sqlx::Error> {
        match search.and_then(like_pattern) {
            Some(pattern) => {
                let query = format!(
                    "SELECT {SUMMARY_COLUMNS} FROM entries
                     WHERE search_key LIKE lower($1) ESCAPE '\\'
                     ORDER BY {RANKING}
                     LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, EntrySummary>(&query)
                    .bind(pattern)
                    .bind(window.limit)
                    .bind(window.offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {SUMMARY_COLUMNS} FROM entries
                     ORDER BY {RANKING}
                     LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, EntrySummary>(&query)
                    .bind(window.limit)
                    .bind(window.offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Delete an entry (and, by cascade, its votes). Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take a row lock on an entry for the rest of the transaction.
    ///
    /// Returns `false` if the entry does not exist.
    pub async fn lock_for_update(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM entries WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Add one to an entry's score and refresh `updated_at`, returning the new score.
    ///
    /// `updated_at` never moves behind `created_at`, even when `now` comes
    /// from a clock that lags the database's.
    pub async fn increment_score(
        conn: &mut PgConnection,
        id: DbId,
        now: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let (score,): (i64,) = sqlx::query_as(
            "UPDATE entries
             SET score = score + 1, updated_at = GREATEST(created_at, $2)
             WHERE id = $1
             RETURNING score",
        )
        .bind(id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(score)
    }
}
