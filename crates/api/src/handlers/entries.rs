//! Handlers for gallery entries: listing, submission, photos and votes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;
use axum::response::{Redirect, Response};
use axum::Json;
use chrono::Utc;
use showcase_core::entry::{etag_matches, photo_etag, EntryForm, PHOTO_MAX_AGE_SECS};
use showcase_core::error::CoreError;
use showcase_core::photo::IngestedPhoto;
use showcase_core::types::DbId;
use showcase_core::voting::{ceil_secs, VoteOutcome};
use showcase_db::models::entry::{CreateEntry, EntrySummary};
use showcase_db::repositories::EntryRepo;

use crate::error::{AppError, AppResult};
use crate::query::ListEntriesParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Where a browser lands after a successful vote.
pub const GALLERY_PATH: &str = "/api/v1/entries";

/// GET /api/v1/entries?q=&page=&page_size=
///
/// Ranked by score, newest first among equal scores.
pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<ListEntriesParams>,
) -> AppResult<Json<DataResponse<Vec<EntrySummary>>>> {
    let window = state.config.page_config().window(params.page, params.page_size);
    let entries = EntryRepo::list(&state.pool, params.q.as_deref(), window).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/entries/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EntrySummary>>> {
    let entry = EntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Entry",
            id,
        }))?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/entries
///
/// Multipart form with `full_name`, `country`, `city`, an optional
/// `description` and a `photo` file. The photo is normalised to a bounded
/// JPEG before anything is stored.
pub async fn create_entry(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<EntrySummary>>)> {
    let mut form = EntryForm::default();
    let mut photo: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "photo" => {
                let data = field.bytes().await.map_err(multipart_error)?;
                photo = Some(data.to_vec());
            }
            "full_name" => form.full_name = field.text().await.map_err(multipart_error)?,
            "country" => form.country = field.text().await.map_err(multipart_error)?,
            "city" => form.city = field.text().await.map_err(multipart_error)?,
            "description" => form.description = field.text().await.map_err(multipart_error)?,
            _ => {} // ignore unknown fields
        }
    }

    let form = form.into_valid()?;
    let raw = photo
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required 'photo' field".into()))?;

    let ingested = ingest_photo(&state, raw).await?;

    let input = CreateEntry {
        full_name: form.full_name,
        country: form.country,
        city: form.city,
        description: form.description,
        photo_bytes: ingested.bytes,
        photo_content_type: ingested.content_type.to_string(),
    };
    let entry = EntryRepo::create(&state.pool, &input).await?;

    tracing::info!(
        entry_id = %entry.id,
        bytes = entry.photo_size,
        width = ingested.width,
        height = ingested.height,
        quality = ingested.quality,
        "Entry created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// Run the CPU-bound ingestion off the async runtime, bounded by the
/// ingestion semaphore. The permit is held by the blocking task itself.
async fn ingest_photo(state: &AppState, raw: Vec<u8>) -> AppResult<IngestedPhoto> {
    let permit = Arc::clone(&state.ingest_permits)
        .acquire_owned()
        .await
        .map_err(|e| AppError::InternalError(format!("Ingestion limiter closed: {e}")))?;
    let ingestor = Arc::clone(&state.ingestor);

    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        ingestor.ingest(&raw)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Photo ingestion task failed: {e}")))?;

    Ok(result?)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// GET /api/v1/entries/{id}/photo
///
/// Serves the stored JPEG with a strong ETag and a long cache lifetime;
/// a matching `If-None-Match` gets 304 with no body.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let photo = EntryRepo::find_photo(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Entry",
            id,
        }))?;

    let etag = photo_etag(photo.id, photo.updated_at);
    let cache_control = format!("public, max-age={PHOTO_MAX_AGE_SECS}");

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));

    let builder = Response::builder()
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, cache_control);

    let response = if not_modified {
        builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())
    } else {
        builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, photo.photo_content_type)
            .header(header::CONTENT_LENGTH, photo.photo_bytes.len().to_string())
            .body(Body::from(photo.photo_bytes))
    };

    response.map_err(|e| AppError::InternalError(format!("Failed to build photo response: {e}")))
}

/// POST /api/v1/entries/{id}/vote
///
/// An accepted vote redirects (303) back to the gallery. A vote inside the
/// entry's window gets 429 with `Retry-After`. A serialization conflict is
/// retried once with a fresh transaction.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Redirect> {
    let outcome = match state.admission.try_vote(&state.pool, id, Utc::now()).await {
        Err(e) if e.is_retryable() => {
            tracing::debug!(entry_id = %id, error = %e, "Vote conflicted, retrying once");
            state.admission.try_vote(&state.pool, id, Utc::now()).await?
        }
        other => other?,
    };

    match outcome {
        VoteOutcome::Accepted { score } => {
            tracing::info!(entry_id = %id, score, "Vote accepted");
            Ok(Redirect::to(GALLERY_PATH))
        }
        VoteOutcome::RateLimited { retry_after } => {
            let retry_after_secs = ceil_secs(retry_after);
            tracing::info!(entry_id = %id, retry_after_secs, "Vote rate limited");
            Err(AppError::RateLimited { retry_after_secs })
        }
    }
}
