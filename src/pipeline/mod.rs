//! Search → verify → rank
//!
//! The only entry point the CLI needs: [`run`] takes a fully specified
//! [`PipelineConfig`] plus the three collaborators and either produces the
//! complete [`RankedReport`] or fails as a whole. Input is validated before
//! the first collaborator call.

mod error;

pub use error::{ErrorCategory, PipelineError, Stage};

use crate::query::{marker_query, DateRangeQueryBuilder, DateWindow};
use crate::ranking::{aggregate, RankedReport};
use crate::search::{PaginatedSearchCollector, SearchCollaborator};
use crate::verify::{DetailLookup, IdentityLookup, MessageVerifier, DEFAULT_PREVIEW_CHARS};
use chrono::NaiveDate;
use std::sync::Arc;

/// Default number of search hits to analyse
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default number of ranked messages to report
pub const DEFAULT_TOP_N: usize = 3;

/// Everything one run needs, with no ambient state
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reaction name, with or without surrounding colons
    pub marker: String,
    pub window: DateWindow,
    pub max_results: usize,
    pub top_n: usize,
    /// "Today" for relative `--days` windows
    pub reference_date: NaiveDate,
    pub preview_chars: usize,
    /// Concurrent detail lookups; 1 = strictly sequential
    pub verify_concurrency: usize,
}

impl PipelineConfig {
    pub fn new(marker: impl Into<String>, window: DateWindow) -> Self {
        Self {
            marker: marker.into(),
            window,
            max_results: DEFAULT_MAX_RESULTS,
            top_n: DEFAULT_TOP_N,
            reference_date: DateRangeQueryBuilder::today().reference_date(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            verify_concurrency: 1,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn with_verify_concurrency(mut self, verify_concurrency: usize) -> Self {
        self.verify_concurrency = verify_concurrency;
        self
    }
}

/// The external capabilities a run depends on
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchCollaborator>,
    pub details: Arc<dyn DetailLookup>,
    pub identities: Arc<dyn IdentityLookup>,
}

impl Collaborators {
    /// Use one client for all three capabilities
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: SearchCollaborator + DetailLookup + IdentityLookup + 'static,
    {
        Self {
            search: client.clone(),
            details: client.clone(),
            identities: client,
        }
    }
}

/// Strip whitespace and surrounding colons: `:pray:` → `pray`
pub fn normalize_marker(raw: &str) -> Result<String, PipelineError> {
    let name = raw.trim().trim_matches(':');
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(PipelineError::InvalidInput(format!(
            "'{}' is not a valid emoji name",
            raw
        )));
    }
    Ok(name.to_string())
}

/// Run the whole search → verify → rank pipeline
pub async fn run(
    config: &PipelineConfig,
    collaborators: &Collaborators,
) -> Result<RankedReport, PipelineError> {
    let marker = normalize_marker(&config.marker)?;
    if config.max_results == 0 {
        return Err(PipelineError::InvalidInput(
            "maximum search results must be at least 1".to_string(),
        ));
    }
    if config.top_n == 0 {
        return Err(PipelineError::InvalidInput(
            "top N must be at least 1".to_string(),
        ));
    }

    let clause = DateRangeQueryBuilder::new(config.reference_date)
        .build(&config.window)?;
    let query = marker_query(&marker, &clause);
    tracing::info!(
        %query,
        max_results = config.max_results,
        "Searching messages"
    );

    let hits = PaginatedSearchCollector::new(collaborators.search.clone())
        .collect(&query, config.max_results)
        .await?;
    tracing::info!(hits = hits.len(), "Search complete, verifying reactions");

    let verifier = MessageVerifier::new(
        collaborators.details.clone(),
        collaborators.identities.clone(),
        config.preview_chars,
    );
    let verified = verifier
        .verify_all(&hits, &marker, config.verify_concurrency)
        .await?;
    tracing::info!(
        hits = hits.len(),
        verified = verified.len(),
        "Verification complete"
    );

    Ok(aggregate(verified, config.top_n))
}
