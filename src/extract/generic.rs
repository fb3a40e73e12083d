//! Generic container-based extraction

use crate::extract::{compile, ExtractError};
use scraper::ElementRef;

/// Candidate containers in order of preference; `body` is the last resort
const CONTAINERS: &[&str] = &[
    "main",
    "article",
    "div.content",
    "div.main-content",
    "div#content",
    "body",
];

/// Subtrees that never carry page content
const NON_CONTENT: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

/// Visible text of the first present content container
///
/// Navigation, headers, footers, asides, scripts and styles inside the
/// container are skipped. Returns an empty string if no container exists.
pub fn extract_generic(root: ElementRef<'_>) -> Result<String, ExtractError> {
    for css in CONTAINERS {
        let selector = compile(css)?;
        if let Some(container) = root.select(&selector).next() {
            let mut parts = Vec::new();
            collect_visible_text(container, &mut parts);
            return Ok(parts.join(" "));
        }
    }
    Ok(String::new())
}

fn collect_visible_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if NON_CONTENT.contains(&child_element.value().name()) {
                continue;
            }
            collect_visible_text(child_element, parts);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
}
