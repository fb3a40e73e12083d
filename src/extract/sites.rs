//! Site-specific content strategies
//!
//! Each strategy returns `Ok(None)` when its markers are absent so the
//! strategy table can hand the page to generic extraction.

use crate::extract::catalog::{self, or_unknown, strip_brackets, strip_ordinal};
use crate::extract::{element_text, ExtractError, FieldSelector};
use scraper::ElementRef;

/// Chart entries summarized in the catalog page's main text
const CATALOG_SUMMARY_LIMIT: usize = 10;

const WIKI_CATEGORIES: FieldSelector =
    FieldSelector::new("#mw-subcategories a", ".CategoryTreeItem a");
const WIKI_PAGES: FieldSelector = FieldSelector::new("#mw-pages li", ".mw-category-group li");

const GITHUB_TOPICS: FieldSelector = FieldSelector::new(".topic-tag", "a[data-octo-click=\"topic_click\"]");
const GITHUB_REPOS: FieldSelector =
    FieldSelector::new(".text-bold.wb-break-word", "h3 a[href*=\"/\"]");

/// Top chart entries, one `"title (year) - Rating: r"` line each
pub fn catalog_content(root: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    let mut lines = Vec::new();
    for item in catalog::ITEMS
        .select_all(root)?
        .into_iter()
        .take(CATALOG_SUMMARY_LIMIT)
    {
        let title = catalog::TITLE
            .select_first(item)?
            .map(|e| strip_ordinal(&element_text(e)).to_string());
        let year = catalog::YEAR
            .select_first(item)?
            .map(|e| strip_brackets(&element_text(e)).to_string());
        let rating = catalog::RATING.select_first(item)?.map(element_text);

        let (title, year, rating) = (or_unknown(title), or_unknown(year), or_unknown(rating));
        lines.push(format!("{} ({}) - Rating: {}", title, year, rating));
    }

    Ok(joined(lines))
}

/// Subcategory names and member pages of a category listing
pub fn wikipedia_content(root: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    let mut lines = Vec::new();
    push_listing(&mut lines, "Categories", WIKI_CATEGORIES.texts(root)?);
    push_listing(&mut lines, "Pages", WIKI_PAGES.texts(root)?);
    Ok(joined(lines))
}

/// Topic tags and repository names of a topic page
pub fn github_content(root: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    let mut lines = Vec::new();
    push_listing(&mut lines, "Topics", GITHUB_TOPICS.texts(root)?);
    push_listing(&mut lines, "Repositories", GITHUB_REPOS.texts(root)?);
    Ok(joined(lines))
}

/// Image descriptions taken from `alt` attributes
pub fn unsplash_content(root: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    let selector = crate::extract::compile("img[alt]")?;
    let descriptions: Vec<String> = root
        .select(&selector)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .collect();

    let mut lines = Vec::new();
    push_listing(&mut lines, "Images", descriptions);
    Ok(joined(lines))
}

fn push_listing(lines: &mut Vec<String>, label: &str, items: Vec<String>) {
    if !items.is_empty() {
        lines.push(format!("{}: {}", label, items.join(", ")));
    }
}

fn joined(lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn run(
        strategy: fn(ElementRef<'_>) -> Result<Option<String>, ExtractError>,
        html: &str,
    ) -> Option<String> {
        let document = Html::parse_document(html);
        strategy(document.root_element()).unwrap()
    }

    #[test]
    fn test_catalog_summary_lines() {
        let html = r#"<html><body><ul>
            <li class="ipc-metadata-list-summary-item">
                <h3 class="ipc-title__text">1. Alpha</h3>
                <span class="cli-title-metadata-item">1994</span>
                <span class="ipc-rating-star">9.3</span>
            </li>
            <li class="ipc-metadata-list-summary-item">
                <h3 class="ipc-title__text">2. Beta</h3>
            </li>
        </ul></body></html>"#;
        let text = run(catalog_content, html).unwrap();
        assert_eq!(
            text,
            "Alpha (1994) - Rating: 9.3\nBeta (unknown) - Rating: unknown"
        );
    }

    #[test]
    fn test_catalog_summary_is_capped() {
        let items: String = (1..=15)
            .map(|i| {
                format!(
                    r#"<li class="ipc-metadata-list-summary-item"><h3 class="ipc-title__text">{}. Film {}</h3></li>"#,
                    i, i
                )
            })
            .collect();
        let html = format!("<html><body><ul>{}</ul></body></html>", items);
        let text = run(catalog_content, &html).unwrap();
        assert_eq!(text.lines().count(), CATALOG_SUMMARY_LIMIT);
        assert!(text.ends_with("Film 10 (unknown) - Rating: unknown"));
    }

    #[test]
    fn test_catalog_without_items_defers() {
        assert!(run(catalog_content, "<html><body><p>x</p></body></html>").is_none());
    }

    #[test]
    fn test_wikipedia_listing() {
        let html = r#"<html><body>
            <div id="mw-subcategories"><a href="/a">Clustering</a><a href="/b">Regression</a></div>
            <div id="mw-pages"><ul><li>K-means</li><li>DBSCAN</li></ul></div>
        </body></html>"#;
        let text = run(wikipedia_content, html).unwrap();
        assert_eq!(
            text,
            "Categories: Clustering, Regression\nPages: K-means, DBSCAN"
        );
    }

    #[test]
    fn test_wikipedia_legacy_markup() {
        let html = r#"<html><body>
            <div class="mw-category-group"><ul><li>Perceptron</li></ul></div>
        </body></html>"#;
        assert_eq!(run(wikipedia_content, html).unwrap(), "Pages: Perceptron");
    }

    #[test]
    fn test_github_topics() {
        let html = r#"<html><body>
            <a class="topic-tag">rust</a><a class="topic-tag">cli</a>
            <h3><a class="text-bold wb-break-word" href="/o/r">ripgrep</a></h3>
        </body></html>"#;
        let text = run(github_content, html).unwrap();
        assert_eq!(text, "Topics: rust, cli\nRepositories: ripgrep");
    }

    #[test]
    fn test_unsplash_alt_text() {
        let html = r#"<html><body>
            <img alt="Mountain lake" src="1.jpg"><img alt="" src="2.jpg"><img src="3.jpg">
        </body></html>"#;
        assert_eq!(run(unsplash_content, html).unwrap(), "Images: Mountain lake");
        assert!(run(unsplash_content, "<html><body><img src=\"x\"></body></html>").is_none());
    }
}
