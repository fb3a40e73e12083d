//! URL helpers for Gleaner
//!
//! Host extraction for dispatch and the tracking-link filter applied to
//! every outbound link.

mod domain;

pub use domain::{extract_domain, host_of};

/// Path fragments that mark advertising or click-tracking links
pub const TRACKING_PATTERNS: &[&str] = &["/ad/", "/track/", "/click?"];

/// Schemes that never lead to a navigable page
pub const NON_NAVIGATIONAL_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:"];

/// Returns true if the absolute URL matches a known tracking pattern
///
/// # Examples
///
/// ```
/// use gleaner::url::is_tracking_url;
///
/// assert!(is_tracking_url("http://t.co/ad/1"));
/// assert!(!is_tracking_url("https://example.com/articles/1"));
/// ```
pub fn is_tracking_url(url: &str) -> bool {
    TRACKING_PATTERNS.iter().any(|pattern| url.contains(pattern))
}

/// Returns true if the raw href uses a scheme that should be skipped
pub fn is_non_navigational(href: &str) -> bool {
    let lowered = href.trim_start().to_ascii_lowercase();
    NON_NAVIGATIONAL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}
