use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use showcase_core::error::CoreError;
use showcase_core::photo::IngestError;
use showcase_db::admission::VoteError;
use showcase_db::tx::SERIALIZATION_FAILURE;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the engine errors, and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `showcase_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The uploaded photo could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A vote attempt failed for a reason other than rate limiting.
    #[error(transparent)]
    Vote(#[from] VoteError),

    /// The entry already received a vote inside the current window.
    #[error("Rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// The request body exceeded the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Engine errors ---
            AppError::Ingest(err) => classify_ingest_error(err),
            AppError::Vote(err) => match err {
                VoteError::EntryNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Entry with id {id} not found"),
                ),
                VoteError::Conflict(_) => {
                    tracing::warn!(error = %err, "Vote conflict persisted after retry");
                    busy()
                }
                VoteError::Database(db) => classify_sqlx_error(db),
            },
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("This entry was voted for recently; try again in {retry_after_secs} seconds"),
            ),

            // --- HTTP-specific errors ---
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            let secs = retry_after_secs.max(0).to_string();
            if let Ok(value) = HeaderValue::from_str(&secs) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn busy() -> (StatusCode, &'static str, String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "TRY_AGAIN",
        "The request conflicted with a concurrent update; please retry".to_string(),
    )
}

/// Classify an ingestion failure. Everything except an encoder fault is the
/// client's to fix.
fn classify_ingest_error(err: &IngestError) -> (StatusCode, &'static str, String) {
    if !err.is_client_error() {
        tracing::error!(error = %err, "Photo encoding failed");
        return internal();
    }
    match err {
        IngestError::InputTooLarge { .. } => {
            (StatusCode::BAD_REQUEST, "PHOTO_TOO_LARGE", err.to_string())
        }
        IngestError::CannotFit { .. } => {
            (StatusCode::BAD_REQUEST, "PHOTO_CANNOT_FIT", err.to_string())
        }
        _ => (
            StatusCode::BAD_REQUEST,
            "INVALID_IMAGE",
            "The photo could not be read as an image".to_string(),
        ),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Serialization failures map to 503.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
                tracing::warn!(error = %db_err, "Serialization failure");
                return busy();
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let response = AppError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[test]
    fn ingest_client_errors_are_bad_request() {
        let response = AppError::Ingest(IngestError::CannotFit {
            limit: 100,
            smallest: 250,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Ingest(IngestError::InputTooLarge {
            actual: 2,
            limit: 1,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ingest_encoder_fault_is_500() {
        let err = image::ImageError::IoError(std::io::Error::other("encoder gave up"));
        let response = AppError::Ingest(IngestError::Encode(err)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn vote_conflict_after_retry_is_503() {
        let response = AppError::Vote(VoteError::Conflict(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_vote_target_is_not_found() {
        let response = AppError::Vote(VoteError::EntryNotFound(uuid::Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_is_404() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_is_400() {
        let response = AppError::Core(CoreError::Validation("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
