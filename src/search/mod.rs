//! Keyword search over the message archive
//!
//! The search index is fuzzy: a query for messages carrying a reaction also
//! returns messages that only mention the emoji in their text. Hits produced
//! here are candidates, to be confirmed by [`crate::verify`].

mod collector;

pub use collector::{PaginatedSearchCollector, SEARCH_PAGE_CEILING};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search API rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("Search not authorized: {0}")]
    Unauthorized(String),

    #[error("Search failed: {0}")]
    Failed(String),
}

pub(crate) fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}

/// Unverified search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identity assigned by the search backend, understood by the detail lookup
    pub id: String,

    /// Matched text as returned by the search
    pub raw_text: String,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<SearchHit>,

    /// Whether the backend reports further pages
    pub has_more: bool,

    /// Total match count, when the backend reports one
    pub total: Option<u64>,
}

/// Paged keyword search capability
#[async_trait]
pub trait SearchCollaborator: Send + Sync {
    /// Fetch page `page` (1-based) holding at most `page_size` hits
    async fn search_page(
        &self,
        query: &str,
        page_size: usize,
        page: u32,
    ) -> Result<SearchPage, SearchError>;
}
