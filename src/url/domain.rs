use url::Url;

/// Extracts the lowercase host from a parsed URL
///
/// Ports are dropped, so `https://EXAMPLE.com:8080/x` yields `example.com`.
/// Returns `None` for URLs without a host (e.g. `data:` URLs).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gleaner::url::extract_domain;
///
/// let url = Url::parse("https://WWW.IMDb.com/chart/top").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.imdb.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses `raw` and returns its lowercase host
///
/// Used for strategy and readiness dispatch, where an unparseable target
/// simply falls through to the generic behaviour.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim()).ok().as_ref().and_then(extract_domain)
}
