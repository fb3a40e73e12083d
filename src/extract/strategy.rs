//! Host-keyed strategy table

use crate::extract::{extract_generic, sites, ExtractError};
use scraper::ElementRef;

/// Extracts main text from a parsed page
///
/// `Ok(None)` means the strategy recognized nothing and the generic
/// strategy should take over.
pub type StrategyFn = fn(ElementRef<'_>) -> Result<Option<String>, ExtractError>;

/// An extraction function bound to a host pattern
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    /// Matched as a substring of the page host
    pub host_pattern: &'static str,
    pub extract: StrategyFn,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("host_pattern", &self.host_pattern)
            .finish()
    }
}

/// Registered strategies plus the designated generic default
#[derive(Debug, Clone)]
pub struct StrategyTable {
    strategies: Vec<Strategy>,
    fallback: Strategy,
}

impl StrategyTable {
    /// A table containing only the generic strategy
    pub fn generic_only() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: Strategy {
                name: "generic",
                host_pattern: "",
                extract: generic_strategy,
            },
        }
    }

    /// The built-in site strategies
    pub fn standard() -> Self {
        let mut table = Self::generic_only();
        table
            .register(Strategy {
                name: "catalog",
                host_pattern: crate::extract::CATALOG_HOST,
                extract: sites::catalog_content,
            })
            .register(Strategy {
                name: "wikipedia",
                host_pattern: "wikipedia.org",
                extract: sites::wikipedia_content,
            })
            .register(Strategy {
                name: "github",
                host_pattern: "github.com",
                extract: sites::github_content,
            })
            .register(Strategy {
                name: "unsplash",
                host_pattern: "unsplash.com",
                extract: sites::unsplash_content,
            });
        table
    }

    /// Adds a strategy; earlier registrations win on overlapping patterns
    pub fn register(&mut self, strategy: Strategy) -> &mut Self {
        self.strategies.push(strategy);
        self
    }

    /// The strategy serving `host`, if any site strategy matches
    pub fn lookup(&self, host: &str) -> Option<&Strategy> {
        self.strategies
            .iter()
            .find(|s| !s.host_pattern.is_empty() && host.contains(s.host_pattern))
    }

    /// Runs the matching strategy, degrading to the generic one
    pub fn extract_content(&self, host: &str, root: ElementRef<'_>) -> Result<String, ExtractError> {
        if let Some(strategy) = self.lookup(host) {
            match (strategy.extract)(root) {
                Ok(Some(text)) => return Ok(text),
                Ok(None) => {
                    tracing::debug!(strategy = strategy.name, host, "Strategy matched nothing, using generic extraction");
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name, host, "Strategy failed, using generic extraction: {}", e);
                }
            }
        }

        Ok((self.fallback.extract)(root)?.unwrap_or_default())
    }
}

fn generic_strategy(root: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    extract_generic(root).map(Some)
}
