//! Gallery listing: pagination bounds and substring-search patterns.
//!
//! Lives in `core` so the repository layer and the HTTP layer agree on the
//! same clamping rules.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of entries per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of entries per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page-size bounds, configurable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// A clamped `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number after clamping.
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageConfig {
    /// Resolve user-supplied `page` / `page_size` into a bounded window.
    ///
    /// ```
    /// use showcase_core::listing::PageConfig;
    ///
    /// let w = PageConfig::default().window(Some(3), Some(10));
    /// assert_eq!((w.limit, w.offset), (10, 20));
    /// ```
    pub fn window(&self, page: Option<i64>, page_size: Option<i64>) -> PageWindow {
        let max = self.max_page_size.max(1);
        let limit = clamp_limit(page_size, self.default_page_size.clamp(1, max), max);
        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(limit);
        PageWindow {
            page,
            limit,
            offset,
        }
    }
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

// ---------------------------------------------------------------------------
// Substring search
// ---------------------------------------------------------------------------

/// Escape character used in the `LIKE ... ESCAPE` clause.
pub const LIKE_ESCAPE: char = '\\';

/// Turn a free-text query into a case-folded `LIKE` pattern.
///
/// - Surrounding whitespace is ignored; an empty query means "no filter".
/// - `%`, `_` and the escape character are escaped so user input always
///   matches literally.
/// - The result is wrapped in `%...%` for substring matching against the
///   lowercase `search_key` column. Case is left alone here; the query folds
///   the pattern with the same `lower()` that builds the column.
///
/// # Examples
///
/// ```
/// use showcase_core::listing::like_pattern;
///
/// assert_eq!(like_pattern("  Berlin "), Some("%Berlin%".to_string()));
/// assert_eq!(like_pattern("100%"), Some("%100\\%%".to_string()));
/// assert_eq!(like_pattern("   "), None);
/// ```
pub fn like_pattern(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(trimmed.len() + 2);
    pattern.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
