//! Outbound link extraction

use crate::extract::{compile, ExtractError};
use crate::url::{is_non_navigational, is_tracking_url};
use scraper::ElementRef;
use std::collections::BTreeSet;
use url::Url;

/// Extracts every navigable link on the page as an absolute URL
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against `base_url`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Anything that does not resolve to http or https
/// - Known tracking paths (`/ad/`, `/track/`, `/click?`)
///
/// Duplicates collapse; the set carries no document order.
///
/// # Arguments
///
/// * `root` - Root element of the parsed document
/// * `base_url` - The URL the page was fetched from
pub fn extract_links(root: ElementRef<'_>, base_url: &Url) -> Result<BTreeSet<String>, ExtractError> {
    let selector = compile("a[href]")?;

    Ok(root
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect())
}

/// Resolves an href to an absolute http(s) URL, or `None` if it must be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || is_non_navigational(href) {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    let absolute_url = absolute_url.to_string();
    if is_tracking_url(&absolute_url) {
        return None;
    }

    Some(absolute_url)
}
