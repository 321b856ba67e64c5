//! Gallery entry models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use showcase_core::types::{DbId, Timestamp};

/// An entry without its photo payload, as listed in the gallery.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntrySummary {
    pub id: DbId,
    pub full_name: String,
    pub country: String,
    pub city: String,
    pub description: String,
    pub photo_content_type: String,
    /// Stored photo size in bytes.
    pub photo_size: i32,
    pub score: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The photo columns of an entry, for serving the image.
#[derive(Debug, Clone, FromRow)]
pub struct EntryPhoto {
    pub id: DbId,
    pub photo_bytes: Vec<u8>,
    pub photo_content_type: String,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new entry. Text fields are expected to be validated.
#[derive(Debug, Clone)]
pub struct CreateEntry {
    pub full_name: String,
    pub country: String,
    pub city: String,
    pub description: String,
    pub photo_bytes: Vec<u8>,
    pub photo_content_type: String,
}
