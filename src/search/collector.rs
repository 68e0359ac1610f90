//! Page-by-page collection of search hits

use crate::search::{SearchCollaborator, SearchError, SearchHit};
use std::sync::Arc;

/// Largest page the search backend will serve
pub const SEARCH_PAGE_CEILING: usize = 100;

/// Drives a [`SearchCollaborator`] until enough hits are gathered
///
/// Hits keep the backend's order across pages. Identities are not
/// deduplicated; a hit repeated by the backend is verified twice.
pub struct PaginatedSearchCollector {
    search: Arc<dyn SearchCollaborator>,
}

impl PaginatedSearchCollector {
    pub fn new(search: Arc<dyn SearchCollaborator>) -> Self {
        Self { search }
    }

    /// Collect up to `max_results` hits for `query`
    ///
    /// Stops when the cap is reached, when a page comes back short, or when
    /// the backend reports no further pages. Any backend error aborts the
    /// collection and the hits gathered so far are dropped.
    pub async fn collect(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut hits: Vec<SearchHit> = Vec::with_capacity(max_results.min(SEARCH_PAGE_CEILING));
        let mut page: u32 = 1;

        while hits.len() < max_results {
            let requested = SEARCH_PAGE_CEILING.min(max_results - hits.len());
            let result = self.search.search_page(query, requested, page).await?;

            if page == 1 {
                if let Some(total) = result.total {
                    tracing::info!(total, max_results, "Search matched messages");
                }
            }

            let received = result.items.len();
            tracing::debug!(
                page,
                requested,
                received,
                has_more = result.has_more,
                "Fetched search page"
            );

            hits.extend(result.items);

            if received < requested || !result.has_more {
                break;
            }
            page += 1;
        }

        hits.truncate(max_results);
        Ok(hits)
    }
}
