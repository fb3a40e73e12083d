//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// A wrapper around the robotstxt matcher that keeps the raw body and
/// evaluates rules on demand.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given agent token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check (e.g., "/page.html")
    /// * `agent` - The agent token matched against `User-agent` groups
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("/any/path", "gleaner"));
        assert!(robots.is_allowed("/admin", "gleaner"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("/", "gleaner"));
        assert!(!robots.is_allowed("https://example.com/page", "gleaner"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("https://example.com/", "gleaner"));
        assert!(!robots.is_allowed("https://example.com/private", "gleaner"));
        assert!(robots.is_allowed("https://example.com/private/public", "gleaner"));
    }

    #[test]
    fn test_parse_specific_agent() {
        let content = "User-agent: gleaner\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(!robots.is_allowed("/page", "gleaner"));
        assert!(robots.is_allowed("/page", "otherbot"));
    }

    #[test]
    fn test_garbage_allows_everything() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed("/any/path", "gleaner"));
    }

    #[test]
    fn test_empty_robots_txt() {
        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allowed("/any/path", "gleaner"));
    }
}
