//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Query parameters for the gallery listing (`?q=&page=&page_size=`).
///
/// Values are clamped by [`showcase_core::listing::PageConfig::window`].
#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesParams {
    /// Case-insensitive substring over name, country, city and description.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
