//! Vote record model.

use sqlx::FromRow;
use showcase_core::types::{DbId, Timestamp};

/// A row from the `votes` table. Never updated once inserted.
#[derive(Debug, Clone, FromRow)]
pub struct Vote {
    pub id: DbId,
    pub entry_id: DbId,
    pub cast_at: Timestamp,
}
