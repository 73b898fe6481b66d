//! Paginated retrieval of an author's works.

use std::sync::Arc;
use std::time::Duration;

use super::PipelineError;
use crate::models::WorkRecord;
use crate::sources::{BibliographicSource, PageRequest, PaginationMode, PAGE_SIZE};
use crate::utils::PiMatcher;

/// Retrieves the complete, capped list of an author's works
///
/// Pagination stops at the first of:
///
/// - an empty page
/// - a page shorter than requested
/// - a cursor-paginated page without a next cursor
/// - `max_results` records accumulated
///
/// Every page request failure is fatal: a run never produces a snapshot
/// from a partial listing.
#[derive(Debug, Clone)]
pub struct WorksFetcher {
    source: Arc<dyn BibliographicSource>,
    page_delay: Duration,
    pi: PiMatcher,
}

impl WorksFetcher {
    pub fn new(source: Arc<dyn BibliographicSource>) -> Self {
        Self {
            source,
            page_delay: Duration::ZERO,
            pi: PiMatcher::default(),
        }
    }

    /// Pause between consecutive requests
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_pi_matcher(mut self, pi: PiMatcher) -> Self {
        self.pi = pi;
        self
    }

    /// Fetch up to `max_results` works in source order
    pub async fn fetch_all(
        &self,
        author_id: &str,
        max_results: usize,
    ) -> Result<Vec<WorkRecord>, PipelineError> {
        let mode = self.source.pagination();
        let mut works: Vec<WorkRecord> = Vec::new();
        let mut request = PageRequest::first(PAGE_SIZE);
        let mut pages = 0usize;

        while works.len() < max_results {
            if !request.is_first() {
                self.pause().await;
            }

            let page = self
                .source
                .fetch_works_page(author_id, &request)
                .await
                .map_err(|source| PipelineError::WorksPage {
                    offset: request.offset,
                    source,
                })?;
            pages += 1;

            let received = page.len();
            tracing::debug!(page = pages, offset = request.offset, received, "received works page");
            if received == 0 {
                break;
            }
            works.extend(page.works);

            if received < request.per_page {
                break;
            }
            let next_cursor = match mode {
                PaginationMode::Offset => None,
                PaginationMode::Cursor => match page.next_cursor {
                    Some(cursor) => Some(cursor),
                    None => break,
                },
            };
            request = request.next(received, next_cursor);
        }

        works.truncate(max_results);
        tracing::info!(works = works.len(), pages, "fetched works");

        if self.source.supports_detail() {
            self.expand_truncated(&mut works).await;
        }

        for work in &mut works {
            work.pi_author_index = self.pi.find(&work.authors, &work.author_ids);
        }

        Ok(works)
    }

    /// Replace truncated titles and author lists through the detail endpoint
    ///
    /// A failed detail request keeps the truncated values.
    async fn expand_truncated(&self, works: &mut [WorkRecord]) {
        let mut expanded = 0usize;
        let mut failed = 0usize;

        for work in works.iter_mut().filter(|w| w.is_truncated()) {
            let Some(detail_id) = work.ids.detail_id.clone() else {
                continue;
            };

            self.pause().await;
            match self.source.fetch_work_detail(&detail_id).await {
                Ok(detail) => {
                    if let Some(title) = detail.title {
                        work.title = title;
                    }
                    if let Some(authors) = detail.authors {
                        if authors.len() != work.author_ids.len() {
                            work.author_ids.clear();
                        }
                        work.authors = authors;
                    }
                    expanded += 1;
                }
                Err(e) => {
                    tracing::warn!(detail_id = %detail_id, error = %e, "detail request failed, keeping truncated values");
                    failed += 1;
                }
            }
        }

        if expanded + failed > 0 {
            tracing::info!(expanded, failed, "expanded truncated works");
        }
    }

    async fn pause(&self) {
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WorkIds, WorkRecordBuilder};
    use crate::sources::mock::make_work;
    use crate::sources::{MockSource, WorkDetail};

    fn fetcher(source: &Arc<MockSource>) -> WorksFetcher {
        WorksFetcher::new(source.clone())
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let source = Arc::new(MockSource::new().with_page_sizes(&[100, 100, 37]));

        let works = fetcher(&source).fetch_all("A1", 1000).await.unwrap();

        assert_eq!(works.len(), 237);
        let requests = source.page_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests.iter().map(|r| r.offset).collect::<Vec<_>>(),
            vec![0, 100, 200]
        );
        assert!(requests.iter().all(|r| r.per_page == PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_cursor_pages_resubmit_cursor() {
        let source = Arc::new(
            MockSource::new()
                .with_page_sizes(&[100, 100, 37])
                .with_pagination(PaginationMode::Cursor),
        );

        let works = fetcher(&source).fetch_all("A1", 1000).await.unwrap();

        assert_eq!(works.len(), 237);
        let cursors: Vec<Option<String>> =
            source.page_requests().into_iter().map(|r| r.cursor).collect();
        assert_eq!(
            cursors,
            vec![None, Some("cursor-1".to_string()), Some("cursor-2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_cursor_absence_stops() {
        // A full page without a next cursor is the last one
        let source = Arc::new(
            MockSource::new()
                .with_page_sizes(&[100])
                .with_pagination(PaginationMode::Cursor),
        );

        let works = fetcher(&source).fetch_all("A1", 1000).await.unwrap();
        assert_eq!(works.len(), 100);
        assert_eq!(source.page_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let source = Arc::new(MockSource::new().with_page_sizes(&[100, 0, 50]));

        let works = fetcher(&source).fetch_all("A1", 1000).await.unwrap();
        assert_eq!(works.len(), 100);
        assert_eq!(source.page_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_cap_keeps_first_records_in_order() {
        let source = Arc::new(MockSource::new().with_page_sizes(&[100, 100]));

        let works = fetcher(&source).fetch_all("A1", 50).await.unwrap();

        assert_eq!(works.len(), 50);
        assert_eq!(works[0].title, "Work 1");
        assert_eq!(works[49].title, "Work 50");
        assert_eq!(source.page_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_later_page_failure_is_fatal() {
        let source = Arc::new(MockSource::new().with_page_sizes(&[100, 100]).failing_page(1));

        let result = fetcher(&source).fetch_all("A1", 1000).await;
        assert!(matches!(
            result,
            Err(PipelineError::WorksPage { offset: 100, .. })
        ));
    }

    fn truncated(title: &str, authors: &str, detail_id: &str) -> WorkRecord {
        WorkRecordBuilder::new(Some(title))
            .authors_str(authors)
            .venue(Some("Journal X"))
            .year(Some(2023))
            .citations(Some(12))
            .ids(WorkIds {
                detail_id: Some(detail_id.to_string()),
                ..WorkIds::default()
            })
            .build()
    }

    #[tokio::test]
    async fn test_detail_expansion_replaces_title_and_authors_only() {
        let source = Arc::new(
            MockSource::new()
                .with_pages(vec![vec![
                    truncated("Long title …", "A One, B Two, ...", "d1"),
                    make_work("Complete", 2020, 1, "Journal Y"),
                ]])
                .with_detail(
                    "d1",
                    WorkDetail {
                        title: Some("Long title in full".to_string()),
                        authors: Some(vec!["A One".into(), "B Two".into(), "EK Lee".into()]),
                    },
                ),
        );
        let pi = PiMatcher::new(vec!["EK Lee".to_string()], vec![]);

        let works = fetcher(&source)
            .with_pi_matcher(pi)
            .fetch_all("A1", 10)
            .await
            .unwrap();

        assert_eq!(source.detail_requests(), vec!["d1"]);
        assert_eq!(works[0].title, "Long title in full");
        assert_eq!(works[0].authors, vec!["A One", "B Two", "EK Lee"]);
        assert_eq!(works[0].venue, "Journal X");
        assert_eq!(works[0].year, 2023);
        assert_eq!(works[0].citations, 12);
        assert_eq!(works[0].pi_author_index, Some(2));
        assert_eq!(works[1].title, "Complete");
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_truncated_values() {
        let source = Arc::new(
            MockSource::new()
                .with_pages(vec![vec![truncated("Long title …", "A One, ...", "d1")]])
                .failing_detail("d1"),
        );

        let works = fetcher(&source).fetch_all("A1", 10).await.unwrap();

        assert_eq!(works.len(), 1);
        assert_eq!(works[0].title, "Long title …");
        assert_eq!(works[0].authors, vec!["A One", "..."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_between_pages_only() {
        let source = Arc::new(MockSource::new().with_page_sizes(&[100, 100, 37]));
        let start = tokio::time::Instant::now();

        fetcher(&source)
            .with_page_delay(Duration::from_secs(1))
            .fetch_all("A1", 1000)
            .await
            .unwrap();

        // No pause before the first page
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_before_detail_requests() {
        let source = Arc::new(
            MockSource::new()
                .with_pages(vec![vec![
                    truncated("First …", "A One, ...", "d1"),
                    truncated("Second …", "B Two, ...", "d2"),
                    make_work("Complete", 2020, 1, "Journal Y"),
                ]])
                .with_detail("d1", WorkDetail::default())
                .with_detail("d2", WorkDetail::default()),
        );
        let start = tokio::time::Instant::now();

        fetcher(&source)
            .with_page_delay(Duration::from_millis(500))
            .fetch_all("A1", 10)
            .await
            .unwrap();

        assert_eq!(source.detail_requests(), vec!["d1", "d2"]);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
