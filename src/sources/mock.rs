//! Mock sources for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::models::{AuthorStats, JournalMetric, WorkRecord, WorkRecordBuilder};
use crate::sources::{
    BibliographicSource, JournalMetricsSource, PageRequest, PaginationMode, SourceCapabilities,
    SourceError, WorkDetail, WorksPage,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A bibliographic source replaying scripted pages.
///
/// Page `n` of the script answers the `n`-th works request. In cursor mode
/// every page but the last carries a next cursor.
#[derive(Debug)]
pub struct MockSource {
    stats: AuthorStats,
    pages: Vec<Vec<WorkRecord>>,
    pagination: PaginationMode,
    details: HashMap<String, WorkDetail>,
    fail_stats: bool,
    fail_page: Option<usize>,
    fail_details: HashSet<String>,
    page_requests: Mutex<Vec<PageRequest>>,
    detail_requests: Mutex<Vec<String>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Create a new mock source with no works and zeroed stats.
    pub fn new() -> Self {
        Self {
            stats: AuthorStats::default(),
            pages: Vec::new(),
            pagination: PaginationMode::Offset,
            details: HashMap::new(),
            fail_stats: false,
            fail_page: None,
            fail_details: HashSet::new(),
            page_requests: Mutex::new(Vec::new()),
            detail_requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the author statistics to return.
    pub fn with_stats(mut self, stats: AuthorStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set the scripted works pages.
    pub fn with_pages(mut self, pages: Vec<Vec<WorkRecord>>) -> Self {
        self.pages = pages;
        self
    }

    /// Script pages of generated works with the given sizes.
    pub fn with_page_sizes(self, sizes: &[usize]) -> Self {
        let mut counter = 0;
        let pages: Vec<Vec<WorkRecord>> = sizes
            .iter()
            .map(|&size| {
                (0..size)
                    .map(|_| {
                        counter += 1;
                        make_work(&format!("Work {}", counter), 2020, 0, "Journal X")
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        self.with_pages(pages)
    }

    pub fn with_pagination(mut self, pagination: PaginationMode) -> Self {
        self.pagination = pagination;
        self
    }

    /// Register an untruncated detail for a detail id.
    pub fn with_detail(mut self, detail_id: &str, detail: WorkDetail) -> Self {
        self.details.insert(detail_id.to_string(), detail);
        self
    }

    /// Make the author stats request fail.
    pub fn failing_stats(mut self) -> Self {
        self.fail_stats = true;
        self
    }

    /// Make the `index`-th works request fail.
    pub fn failing_page(mut self, index: usize) -> Self {
        self.fail_page = Some(index);
        self
    }

    /// Make the detail request for `detail_id` fail.
    pub fn failing_detail(mut self, detail_id: &str) -> Self {
        self.fail_details.insert(detail_id.to_string());
        self
    }

    /// Works requests received so far.
    pub fn page_requests(&self) -> Vec<PageRequest> {
        lock(&self.page_requests).clone()
    }

    /// Detail ids requested so far.
    pub fn detail_requests(&self) -> Vec<String> {
        lock(&self.detail_requests).clone()
    }
}

#[async_trait]
impl BibliographicSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        let mut caps = SourceCapabilities::AUTHOR_STATS | SourceCapabilities::WORKS;
        if !self.details.is_empty() || !self.fail_details.is_empty() {
            caps |= SourceCapabilities::WORK_DETAIL;
        }
        caps
    }

    fn pagination(&self) -> PaginationMode {
        self.pagination
    }

    fn profile_url(&self, author_id: &str) -> Option<String> {
        Some(format!("https://example.org/authors/{}", author_id))
    }

    async fn fetch_author_stats(&self, _author_id: &str) -> Result<AuthorStats, SourceError> {
        if self.fail_stats {
            return Err(SourceError::Network("mock stats failure".to_string()));
        }
        Ok(self.stats.clone())
    }

    async fn fetch_works_page(
        &self,
        _author_id: &str,
        request: &PageRequest,
    ) -> Result<WorksPage, SourceError> {
        let index = {
            let mut requests = lock(&self.page_requests);
            requests.push(request.clone());
            requests.len() - 1
        };

        if self.fail_page == Some(index) {
            return Err(SourceError::Timeout(format!("mock page {} timed out", index)));
        }

        let works = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = match self.pagination {
            PaginationMode::Cursor if index + 1 < self.pages.len() => {
                Some(format!("cursor-{}", index + 1))
            }
            _ => None,
        };
        Ok(WorksPage::new(works, next_cursor))
    }

    async fn fetch_work_detail(&self, detail_id: &str) -> Result<WorkDetail, SourceError> {
        lock(&self.detail_requests).push(detail_id.to_string());

        if self.fail_details.contains(detail_id) {
            return Err(SourceError::Api {
                status: 503,
                message: "mock detail failure".to_string(),
            });
        }
        self.details
            .get(detail_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(detail_id.to_string()))
    }
}

/// A journal metadata service answering from a fixed table.
///
/// Keys not in the table have no match. Every lookup is counted.
#[derive(Debug, Default)]
pub struct MockMetricsSource {
    metrics: HashMap<String, JournalMetric>,
    failures: HashSet<String>,
    lookups: Mutex<HashMap<String, usize>>,
}

impl MockMetricsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `key` with a metric.
    pub fn with_metric(mut self, key: &str, display_name: &str, impact: Option<f64>) -> Self {
        self.metrics
            .insert(key.to_string(), JournalMetric::new(display_name, impact));
        self
    }

    /// Make lookups of `key` fail.
    pub fn failing(mut self, key: &str) -> Self {
        self.failures.insert(key.to_string());
        self
    }

    /// Number of lookups issued for `key`.
    pub fn lookup_count(&self, key: &str) -> usize {
        lock(&self.lookups).get(key).copied().unwrap_or(0)
    }

    /// Number of lookups issued overall.
    pub fn total_lookups(&self) -> usize {
        lock(&self.lookups).values().sum()
    }
}

#[async_trait]
impl JournalMetricsSource for MockMetricsSource {
    async fn lookup_journal(&self, key: &str) -> Result<Option<JournalMetric>, SourceError> {
        *lock(&self.lookups).entry(key.to_string()).or_insert(0) += 1;

        if self.failures.contains(key) {
            return Err(SourceError::Network(format!("mock lookup of '{}' failed", key)));
        }
        Ok(self.metrics.get(key).cloned())
    }
}

/// Helper function to create a mock work for testing.
pub fn make_work(title: &str, year: u32, citations: u32, venue: &str) -> WorkRecord {
    WorkRecordBuilder::new(Some(title))
        .year(Some(i64::from(year)))
        .citations(Some(i64::from(citations)))
        .venue(Some(venue))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::PAGE_SIZE;

    #[tokio::test]
    async fn test_mock_cursor_pages() {
        let source = MockSource::new()
            .with_page_sizes(&[2, 1])
            .with_pagination(PaginationMode::Cursor);

        let first = source
            .fetch_works_page("a", &PageRequest::first(PAGE_SIZE))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.next_cursor.as_deref(), Some("cursor-1"));

        let second = source
            .fetch_works_page("a", &PageRequest::first(PAGE_SIZE).next(2, first.next_cursor))
            .await
            .unwrap();
        assert_eq!(second.works[0].title, "Work 3");
        assert!(second.next_cursor.is_none());
        assert_eq!(source.page_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_metrics_counts() {
        let source = MockMetricsSource::new()
            .with_metric("journal x", "Journal X", Some(4.2))
            .failing("journal b");

        assert!(source.lookup_journal("journal x").await.unwrap().is_some());
        assert!(source.lookup_journal("unknown").await.unwrap().is_none());
        assert!(source.lookup_journal("journal b").await.is_err());
        assert_eq!(source.lookup_count("journal x"), 1);
        assert_eq!(source.total_lookups(), 3);
    }
}
