#![allow(dead_code)]

use chrono::{DateTime, Utc};
use showcase_db::models::entry::{CreateEntry, EntrySummary};
use showcase_db::repositories::EntryRepo;
use sqlx::PgPool;
use uuid::Uuid;

/// Minimal JPEG SOI/EOI marker pair; repositories never inspect the payload.
pub const FAKE_PHOTO: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

pub fn new_entry(full_name: &str, country: &str, city: &str, description: &str) -> CreateEntry {
    CreateEntry {
        full_name: full_name.to_string(),
        country: country.to_string(),
        city: city.to_string(),
        description: description.to_string(),
        photo_bytes: FAKE_PHOTO.to_vec(),
        photo_content_type: "image/jpeg".to_string(),
    }
}

pub async fn create_named(pool: &PgPool, full_name: &str) -> EntrySummary {
    EntryRepo::create(pool, &new_entry(full_name, "Norway", "Oslo", ""))
        .await
        .unwrap()
}

/// Overwrite score and creation time directly, as a data correction would.
pub async fn set_score_and_created(pool: &PgPool, id: Uuid, score: i64, created_at: DateTime<Utc>) {
    sqlx::query("UPDATE entries SET score = $2, created_at = $3, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(score)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn vote_count(pool: &PgPool, entry_id: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE entry_id = $1")
        .bind(entry_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}
