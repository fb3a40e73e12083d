//! Ranked record extraction for the catalog chart page

use crate::extract::{element_text, ExtractError, FieldSelector};
use scraper::ElementRef;

/// Value stored for any record field the page does not provide
pub const UNKNOWN: &str = "unknown";

/// Host served by the catalog strategy and readiness wait
pub const CATALOG_HOST: &str = "imdb.com";

/// URL fragment identifying the catalog chart page
const CATALOG_PAGE_PATTERN: &str = "imdb.com/chart/top";

pub(super) const ITEMS: FieldSelector = FieldSelector::new(".ipc-metadata-list-summary-item", ".lister-list tr");
pub(super) const TITLE: FieldSelector = FieldSelector::new(".ipc-title__text", ".titleColumn a");
pub(super) const YEAR: FieldSelector = FieldSelector::new(".cli-title-metadata-item", ".titleColumn span");
pub(super) const RATING: FieldSelector = FieldSelector::new(".ipc-rating-star", ".imdbRating strong");
const METADATA: FieldSelector = FieldSelector::primary_only(".cli-title-metadata-item");
const GENRE: FieldSelector = FieldSelector::primary_only(".ipc-chip-list");

/// One ranked entry of the catalog chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// 1-based position in document order
    pub rank: u32,
    pub title: String,
    pub year: String,
    pub genre: String,
    pub rating: String,
    pub duration: String,
}

/// Returns true if `url` is the catalog chart page
pub fn is_catalog_page(url: &str) -> bool {
    url.to_ascii_lowercase().contains(CATALOG_PAGE_PATTERN)
}

/// Extracts chart entries in document order, ranked from 1
///
/// Item elements are matched with the current layout first and the legacy
/// table layout only if none are found. Each field then falls back to its
/// legacy selector independently, and absent fields become [`UNKNOWN`].
pub fn extract_records(root: ElementRef<'_>) -> Result<Vec<CatalogRecord>, ExtractError> {
    let items = ITEMS.select_all(root)?;
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let title = TITLE
            .select_first(item)?
            .map(element_text)
            .map(|t| strip_ordinal(&t).to_string());
        let year = YEAR
            .select_first(item)?
            .map(element_text)
            .map(|t| strip_brackets(&t).to_string());
        let rating = RATING.select_first(item)?.map(element_text);
        let duration = METADATA.select_all(item)?.get(1).copied().map(element_text);
        let genre = GENRE.select_first(item)?.map(element_text);

        records.push(CatalogRecord {
            rank: index as u32 + 1,
            title: or_unknown(title),
            year: or_unknown(year),
            genre: or_unknown(genre),
            rating: or_unknown(rating),
            duration: or_unknown(duration),
        });
    }

    Ok(records)
}

/// Removes a leading `"N. "` rank prefix
pub(super) fn strip_ordinal(title: &str) -> &str {
    match title.split_once(". ") {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim()
        }
        _ => title,
    }
}

pub(super) fn strip_brackets(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '(' || c == ')').trim()
}

pub(super) fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
