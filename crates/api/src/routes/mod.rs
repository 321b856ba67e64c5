pub mod entries;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entries                     list, create (multipart)
/// /entries/{id}                get
/// /entries/{id}/photo          photo bytes with cache validators
/// /entries/{id}/vote           cast a vote (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/entries", entries::router())
}
