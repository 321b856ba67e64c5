//! Transaction scoping.
//!
//! A [`PgTransaction`] rolls back when dropped unless `commit()` succeeded,
//! so every exit path (early return, `?`, panic, a cancelled request
//! future) leaves no partial writes behind. Callers only ever commit
//! explicitly.

use sqlx::{PgPool, Postgres, Transaction};

/// SQLSTATE raised when SERIALIZABLE detects a conflicting concurrent transaction.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when PostgreSQL breaks a lock cycle.
pub const DEADLOCK_DETECTED: &str = "40P01";

/// A transaction borrowed from the pool.
pub type PgTransaction = Transaction<'static, Postgres>;

/// Begin a transaction running at SERIALIZABLE isolation.
///
/// The isolation level is set as the first statement, before any snapshot
/// is taken.
pub async fn begin_serializable(pool: &PgPool) -> Result<PgTransaction, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Whether `err` is a concurrency conflict that a fresh attempt may resolve.
pub fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}
