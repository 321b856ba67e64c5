//! Vote admission: at most one accepted vote per entry per rolling window.
//!
//! The decision and the write happen in one SERIALIZABLE transaction that
//! first row-locks the entry. Concurrent voters for the same entry queue on
//! that lock; once the winner commits, PostgreSQL fails the queued
//! transactions with a serialization error instead of letting them act on
//! a stale read. Those surface as [`VoteError::Conflict`], and a fresh
//! attempt then observes the winner's vote and is rate limited.
//!
//! The engine never retries on its own. Whether to try again is the
//! caller's decision.

use showcase_core::types::{DbId, Timestamp};
use showcase_core::voting::{VoteOutcome, VotePolicy};
use sqlx::PgPool;

use crate::repositories::{EntryRepo, VoteRepo};
use crate::tx::{begin_serializable, is_retryable};

/// Failures of a vote attempt. Rate limiting is not one of them; see
/// [`VoteOutcome::RateLimited`].
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("Entry not found: {0}")]
    EntryNotFound(DbId),

    /// A concurrent transaction won; the whole attempt may be repeated.
    #[error("Vote conflicted with a concurrent transaction: {0}")]
    Conflict(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl VoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VoteError::Conflict(_))
    }
}

impl From<sqlx::Error> for VoteError {
    fn from(err: sqlx::Error) -> Self {
        if is_retryable(&err) {
            VoteError::Conflict(err)
        } else {
            VoteError::Database(err)
        }
    }
}

/// Decides and records votes under a [`VotePolicy`].
#[derive(Debug, Clone, Default)]
pub struct VoteAdmission {
    policy: VotePolicy,
}

impl VoteAdmission {
    pub fn new(policy: VotePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VotePolicy {
        &self.policy
    }

    /// Try to cast one vote for `entry_id` at `now`.
    ///
    /// On `Accepted` the vote row and the score increment are committed
    /// together. On `RateLimited` and on every error nothing is written.
    pub async fn try_vote(
        &self,
        pool: &PgPool,
        entry_id: DbId,
        now: Timestamp,
    ) -> Result<VoteOutcome, VoteError> {
        let mut tx = begin_serializable(pool).await?;

        if !EntryRepo::lock_for_update(&mut tx, entry_id).await? {
            return Err(VoteError::EntryNotFound(entry_id));
        }

        let cutoff = self.policy.cutoff(now);
        if let Some(last_cast) = VoteRepo::latest_after(&mut tx, entry_id, cutoff).await? {
            tx.rollback().await?;
            let retry_after = self.policy.retry_after(last_cast, now);
            tracing::debug!(
                %entry_id,
                retry_after_secs = retry_after.num_seconds(),
                "Vote rate limited"
            );
            return Ok(VoteOutcome::RateLimited { retry_after });
        }

        VoteRepo::insert(&mut tx, entry_id, now).await?;
        let score = EntryRepo::increment_score(&mut tx, entry_id, now).await?;
        tx.commit().await?;

        tracing::debug!(%entry_id, score, "Vote accepted");
        Ok(VoteOutcome::Accepted { score })
    }
}
