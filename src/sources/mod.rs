//! Bibliographic backends with a trait-based architecture.
//!
//! A backend implements [`BibliographicSource`] to provide author statistics
//! and paginated works, and optionally a per-item detail endpoint. Journal
//! metrics come from a [`JournalMetricsSource`]. The pipeline only talks to
//! these traits, so a backend can be swapped without touching aggregation,
//! normalization or the metrics cache.
//!
//! # Backends
//!
//! - `openalex` - OpenAlex REST API (cursor pagination, persistent author ids,
//!   journal metrics). Set `OPENALEX_EMAIL` for the polite pool.
//! - `scholar` - Google Scholar profile pages (offset pagination, truncated
//!   rows expanded through the citation detail page)

mod google_scholar;
pub mod mock;
mod openalex;
mod registry;

pub use google_scholar::ScholarProfileSource;
pub use mock::{MockMetricsSource, MockSource};
pub use openalex::{OpenAlexSource, OPENALEX_API_BASE};
pub use registry::{SourceCapabilities, SourceKind, SourceRegistry};

use async_trait::async_trait;

use crate::models::{AuthorStats, JournalMetric, WorkRecord};

/// Maximum page size requested from any backend
pub const PAGE_SIZE: usize = 100;

/// How a backend continues from one page to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// Numeric offset incremented by the number of records received;
    /// a page shorter than requested is the last one
    Offset,
    /// Opaque cursor returned with each page; no cursor means no more pages
    Cursor,
}

/// Parameters of one works page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of records already received
    pub offset: usize,
    /// Cursor returned by the previous page, `None` for the first page
    pub cursor: Option<String>,
    /// Records requested
    pub per_page: usize,
}

impl PageRequest {
    /// First page
    pub fn first(per_page: usize) -> Self {
        Self {
            offset: 0,
            cursor: None,
            per_page,
        }
    }

    /// Request following a page of `received` records
    pub fn next(&self, received: usize, cursor: Option<String>) -> Self {
        Self {
            offset: self.offset + received,
            cursor,
            per_page: self.per_page,
        }
    }

    pub fn is_first(&self) -> bool {
        self.offset == 0 && self.cursor.is_none()
    }
}

/// One page of works
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksPage {
    pub works: Vec<WorkRecord>,
    /// Continuation for cursor-paginated backends
    pub next_cursor: Option<String>,
}

impl WorksPage {
    pub fn new(works: Vec<WorkRecord>, next_cursor: Option<String>) -> Self {
        Self { works, next_cursor }
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

/// Untruncated fields returned by a detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkDetail {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
}

/// Interface of all bibliographic backends
#[async_trait]
pub trait BibliographicSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "openalex", "scholar")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::AUTHOR_STATS | SourceCapabilities::WORKS
    }

    /// Whether this source has a per-item detail endpoint
    fn supports_detail(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::WORK_DETAIL)
    }

    /// Pagination protocol of the works listing
    fn pagination(&self) -> PaginationMode {
        PaginationMode::Offset
    }

    /// Public profile page of an author, used in report footers
    fn profile_url(&self, _author_id: &str) -> Option<String> {
        None
    }

    /// Fetch the author's summary statistics
    async fn fetch_author_stats(&self, _author_id: &str) -> Result<AuthorStats, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Fetch one page of the author's works
    async fn fetch_works_page(
        &self,
        _author_id: &str,
        _request: &PageRequest,
    ) -> Result<WorksPage, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Fetch the untruncated title and authors of a work
    async fn fetch_work_detail(&self, _detail_id: &str) -> Result<WorkDetail, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Interface of journal metadata services
#[async_trait]
pub trait JournalMetricsSource: Send + Sync + std::fmt::Debug {
    /// Look up the best textual match for a canonical journal key
    ///
    /// `Ok(None)` means the service had no match.
    async fn lookup_journal(&self, key: &str) -> Result<Option<JournalMetric>, SourceError>;
}

/// Errors that can occur when talking to a backend
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Network failure
    #[error("Network error: {0}")]
    Network(String),

    /// Per-request deadline exceeded
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success status from the service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_capabilities() {
        let caps = SourceCapabilities::WORKS | SourceCapabilities::WORK_DETAIL;

        assert!(caps.contains(SourceCapabilities::WORKS));
        assert!(caps.contains(SourceCapabilities::WORK_DETAIL));
        assert!(!caps.contains(SourceCapabilities::AUTHOR_STATS));
    }

    #[test]
    fn test_page_request_progression() {
        let first = PageRequest::first(PAGE_SIZE);
        assert!(first.is_first());

        let second = first.next(100, Some("abc".to_string()));
        assert_eq!(second.offset, 100);
        assert_eq!(second.cursor.as_deref(), Some("abc"));
        assert_eq!(second.per_page, PAGE_SIZE);
        assert!(!second.is_first());
    }
}
