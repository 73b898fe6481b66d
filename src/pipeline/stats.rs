//! Author statistics retrieval.

use std::sync::Arc;

use super::PipelineError;
use crate::models::AuthorStats;
use crate::sources::BibliographicSource;

/// Fetches the author's summary statistics with a single request
///
/// Missing numeric fields are zero; a failed request is fatal for the run.
#[derive(Debug, Clone)]
pub struct AuthorStatsFetcher {
    source: Arc<dyn BibliographicSource>,
}

impl AuthorStatsFetcher {
    pub fn new(source: Arc<dyn BibliographicSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, author_id: &str) -> Result<AuthorStats, PipelineError> {
        self.source
            .fetch_author_stats(author_id)
            .await
            .map_err(PipelineError::AuthorStats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[tokio::test]
    async fn test_fetch_stats() {
        let source = MockSource::new().with_stats(AuthorStats::new("EK Lee", 120, 6, 4));
        let stats = AuthorStatsFetcher::new(Arc::new(source))
            .fetch("A42")
            .await
            .unwrap();
        assert_eq!(stats.h_index, 6);
        assert_eq!(stats.i10_index, 4);
    }

    #[tokio::test]
    async fn test_failure_is_distinct() {
        let source = MockSource::new().failing_stats();
        let result = AuthorStatsFetcher::new(Arc::new(source)).fetch("A42").await;
        assert!(matches!(result, Err(PipelineError::AuthorStats(_))));
    }
}
