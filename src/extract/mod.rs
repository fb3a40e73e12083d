//! Content extraction
//!
//! Turns raw page markup plus its source URL into a [`ParsedDocument`]:
//! - Page title (first `<title>` element)
//! - Main text, via a host-specific strategy or the generic container scan
//! - Canonicalized outbound links
//! - Ranked catalog records, for the one recognized catalog page

mod catalog;
mod generic;
mod links;
mod sites;
mod strategy;

pub use catalog::{extract_records, is_catalog_page, CatalogRecord, CATALOG_HOST, UNKNOWN};
pub use generic::extract_generic;
pub use links::extract_links;
pub use strategy::{Strategy, StrategyFn, StrategyTable};

use crate::url::extract_domain;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Errors raised inside an extraction strategy
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Normalized result of extracting one page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub domain: String,
    pub title: String,
    pub content: String,
    /// Absolute http(s) URLs, tracking links excluded
    pub links: BTreeSet<String>,
    /// Non-empty only for the catalog page
    pub records: Vec<CatalogRecord>,
}

/// Dispatches pages to extraction strategies by host
pub struct Extractor {
    strategies: StrategyTable,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Creates an extractor with the standard strategy table
    pub fn new() -> Self {
        Self::with_strategies(StrategyTable::standard())
    }

    pub fn with_strategies(strategies: StrategyTable) -> Self {
        Self { strategies }
    }

    /// Extracts a document from `content` fetched at `url`
    ///
    /// Strategy-level failures degrade to generic extraction. Returns `None`
    /// only when there is no content at all, the URL cannot be parsed, or the
    /// generic path fails too.
    ///
    /// # Example
    ///
    /// ```
    /// use gleaner::extract::Extractor;
    ///
    /// let html = r#"<html><head><title>Hi</title></head>
    ///     <body><main>Hello</main><a href="/next">next</a></body></html>"#;
    /// let doc = Extractor::new().extract(html, "https://example.com/a").unwrap();
    /// assert_eq!(doc.title, "Hi");
    /// assert_eq!(doc.content, "Hello");
    /// assert!(doc.links.contains("https://example.com/next"));
    /// ```
    pub fn extract(&self, content: &str, url: &str) -> Option<ParsedDocument> {
        if content.trim().is_empty() {
            tracing::error!(url, "Extractor received no content");
            return None;
        }

        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                tracing::error!(url, "Cannot resolve source URL: {}", e);
                return None;
            }
        };

        let document = Html::parse_document(content);
        match self.extract_document(&document, &base, url) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::error!(url, "Error parsing content: {}", e);
                None
            }
        }
    }

    fn extract_document(
        &self,
        document: &Html,
        base: &Url,
        url: &str,
    ) -> Result<ParsedDocument, ExtractError> {
        let root = document.root_element();
        let domain = extract_domain(base).unwrap_or_default();

        let title = extract_title(root)?;
        let content = self.strategies.extract_content(&domain, root)?;
        let links = extract_links(root, base)?;

        let records = if is_catalog_page(url) {
            match extract_records(root) {
                Ok(records) => {
                    tracing::info!(url, count = records.len(), "Extracted catalog records");
                    records
                }
                Err(e) => {
                    tracing::warn!(url, "Catalog record extraction failed: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(ParsedDocument {
            domain,
            title,
            content,
            links,
            records,
        })
    }
}

/// First `<title>` text, or an empty string
fn extract_title(root: ElementRef<'_>) -> Result<String, ExtractError> {
    let selector = compile("title")?;
    Ok(root
        .select(&selector)
        .next()
        .map(element_text)
        .unwrap_or_default())
}

/// Compiles a CSS selector, mapping the parse error into [`ExtractError`]
pub(crate) fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Visible text of an element: trimmed text nodes joined by single spaces
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A field selector with a current-layout primary and an optional legacy fallback
///
/// The legacy selector is consulted only when the primary matches nothing,
/// so markup changes on the target site degrade gracefully.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSelector {
    primary: &'static str,
    legacy: Option<&'static str>,
}

impl FieldSelector {
    pub(crate) const fn new(primary: &'static str, legacy: &'static str) -> Self {
        Self {
            primary,
            legacy: Some(legacy),
        }
    }

    pub(crate) const fn primary_only(primary: &'static str) -> Self {
        Self {
            primary,
            legacy: None,
        }
    }

    pub(crate) fn select_all<'a>(
        &self,
        scope: ElementRef<'a>,
    ) -> Result<Vec<ElementRef<'a>>, ExtractError> {
        let primary = compile(self.primary)?;
        let found: Vec<ElementRef<'a>> = scope.select(&primary).collect();
        if !found.is_empty() {
            return Ok(found);
        }

        match self.legacy {
            Some(css) => {
                let legacy = compile(css)?;
                Ok(scope.select(&legacy).collect())
            }
            None => Ok(found),
        }
    }

    pub(crate) fn select_first<'a>(
        &self,
        scope: ElementRef<'a>,
    ) -> Result<Option<ElementRef<'a>>, ExtractError> {
        Ok(self.select_all(scope)?.into_iter().next())
    }

    /// Texts of all matches, empty matches dropped
    pub(crate) fn texts(&self, scope: ElementRef<'_>) -> Result<Vec<String>, ExtractError> {
        Ok(self
            .select_all(scope)?
            .into_iter()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect())
    }
}
