//! Entry submission rules and photo cache validators.

use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// `Cache-Control` max-age for photo responses: 30 days.
pub const PHOTO_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Text fields of a submission, before the photo is attached.
///
/// Lengths are in characters. The 160-character description cap is
/// mirrored by a CHECK constraint on `entries`.
#[derive(Debug, Clone, Default, Validate)]
pub struct EntryForm {
    #[validate(length(min = 1, max = 120, message = "full_name must be 1-120 characters"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 80, message = "country must be 1-80 characters"))]
    pub country: String,
    #[validate(length(min = 1, max = 80, message = "city must be 1-80 characters"))]
    pub city: String,
    #[validate(length(max = 160, message = "description must be at most 160 characters"))]
    pub description: String,
}

impl EntryForm {
    /// Trim surrounding whitespace from every field.
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            country: self.country.trim().to_string(),
            city: self.city.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    /// Normalise and validate, collapsing field errors into one message.
    pub fn into_valid(self) -> Result<Self, CoreError> {
        let form = self.normalized();
        form.validate().map_err(|errors| {
            let mut messages: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    errs.iter().map(move |e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{field} is invalid"))
                    })
                })
                .collect();
            messages.sort();
            CoreError::Validation(messages.join("; "))
        })?;
        Ok(form)
    }
}

/// Strong ETag for an entry's photo.
///
/// Changes whenever `updated_at` changes, which the store guarantees on
/// every write to the row.
pub fn photo_etag(id: DbId, updated_at: Timestamp) -> String {
    format!("\"{id}-{}\"", updated_at.timestamp_millis())
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*` and comma-separated lists; weak validators (`W/"..."`)
/// compare by their opaque tag.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}
