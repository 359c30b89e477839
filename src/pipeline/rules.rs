//! Keyword relevance gate.
//!
//! Runs before any LLM call: an order whose title and description contain
//! none of the configured keywords is skipped without touching the network.

use tracing::debug;

use crate::pipeline::types::Order;

/// Case-insensitive substring match against a fixed keyword list.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter. Keywords are lowercased; blank entries are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Filter with the built-in keyword list.
    pub fn default_keywords() -> Self {
        Self::new(crate::config::DEFAULT_KEYWORDS)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True iff any keyword occurs in `title + " " + description`, ignoring case.
    pub fn is_relevant(&self, title: &str, description: &str) -> bool {
        let text = format!("{title} {description}").to_lowercase();
        match self.keywords.iter().find(|k| text.contains(k.as_str())) {
            Some(keyword) => {
                debug!(keyword = %keyword, "Order matched keyword");
                true
            }
            None => false,
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.is_relevant(&order.title, &order.description)
    }
}
