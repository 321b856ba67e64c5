//! Route definitions for gallery entries.
//!
//! Mounted at `/entries`.
//!
//! ```text
//! GET  /                  list_entries
//! POST /                  create_entry
//! GET  /{id}              get_entry
//! GET  /{id}/photo        get_photo
//! POST /{id}/vote         cast_vote
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entries;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entries::list_entries).post(entries::create_entry))
        .route("/{id}", get(entries::get_entry))
        .route("/{id}/photo", get(entries::get_photo))
        .route("/{id}/vote", post(entries::cast_vote))
}
