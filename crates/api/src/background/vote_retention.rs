//! Periodic cleanup of expired votes.
//!
//! A vote only matters to admission while it is inside its entry's rolling
//! window. Rows older than that are deleted on a fixed interval so the
//! `votes` table stays bounded by recent traffic.

use std::time::Duration;

use chrono::Utc;
use showcase_core::voting::VotePolicy;
use showcase_db::repositories::VoteRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Delete every vote that can no longer block admission. Returns the
/// number of rows removed.
pub async fn prune_once(pool: &PgPool, policy: &VotePolicy) -> Result<u64, sqlx::Error> {
    VoteRepo::delete_older_than(pool, policy.cutoff(Utc::now())).await
}

/// Run the vote retention loop until `cancel` is triggered.
///
/// The first sweep happens immediately.
pub async fn run(pool: PgPool, policy: VotePolicy, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        window_secs = policy.window().num_seconds(),
        interval_secs = interval.as_secs(),
        "Vote retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Vote retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                match prune_once(&pool, &policy).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Vote retention: purged expired votes");
                        } else {
                            tracing::debug!("Vote retention: no votes to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Vote retention: cleanup failed");
                    }
                }
            }
        }
    }
}
