//! The publication update pipeline.
//!
//! One run flows strictly in one direction:
//!
//! 1. [`AuthorStatsFetcher`] fetches the four summary statistics
//! 2. [`WorksFetcher`] pages through the author's works
//! 3. venues are normalized and the unique keys handed to
//!    [`JournalMetricsResolver`], which fills the [`MetricsCache`] and saves it
//! 4. the snapshot is written atomically
//!
//! Presentation re-derives grouping and enrichment from the snapshot with
//! [`aggregate`], so the snapshot is the only product besides the cache.

mod aggregate;
mod fetcher;
mod resolver;
mod stats;

pub use aggregate::{aggregate, enrich, unique_journal_keys};
pub use fetcher::WorksFetcher;
pub use resolver::{JournalMetricsResolver, ResolveSummary};
pub use stats::AuthorStatsFetcher;

use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::models::PublicationsSnapshot;
use crate::sources::{BibliographicSource, JournalMetricsSource, SourceError};
use crate::utils::{BlobStore, MetricsCache, PiMatcher, DEFAULT_CACHE_KEY};

/// Errors that abort a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required setting missing or invalid; raised before any request
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The author statistics request failed
    #[error("Failed to fetch author statistics: {0}")]
    AuthorStats(#[source] SourceError),

    /// A works page request failed
    #[error("Failed to fetch works page at offset {offset}: {source}")]
    WorksPage {
        offset: usize,
        #[source]
        source: SourceError,
    },

    /// Reading or writing a blob failed
    #[error("Storage error for '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: io::Error,
    },

    /// No snapshot to render from
    #[error("No snapshot found at '{0}'; run an update first")]
    MissingSnapshot(String),

    /// Snapshot could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settings of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub author_id: String,
    pub max_results: usize,
    /// Pause between works pages (and detail requests)
    pub page_delay: Duration,
    /// Minimum spacing between journal lookups
    pub lookup_delay: Duration,
    pub max_concurrent_lookups: usize,
    pub snapshot_key: String,
    pub metrics_cache_key: String,
    pub pi: PiMatcher,
}

impl PipelineSettings {
    /// Settings with default limits and no pacing
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            max_results: 200,
            page_delay: Duration::ZERO,
            lookup_delay: Duration::ZERO,
            max_concurrent_lookups: 1,
            snapshot_key: "publications.json".to_string(),
            metrics_cache_key: DEFAULT_CACHE_KEY.to_string(),
            pi: PiMatcher::default(),
        }
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn pi(mut self, pi: PiMatcher) -> Self {
        self.pi = pi;
        self
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub publications: usize,
    pub with_pi: usize,
    pub journal_keys: usize,
    pub metrics: ResolveSummary,
}

/// Products of a successful run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub snapshot: PublicationsSnapshot,
    pub cache: MetricsCache,
    pub summary: RunSummary,
}

/// The publication update pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Arc<dyn BibliographicSource>,
    metrics: Arc<dyn JournalMetricsSource>,
    store: Arc<dyn BlobStore>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn BibliographicSource>,
        metrics: Arc<dyn JournalMetricsSource>,
        store: Arc<dyn BlobStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            metrics,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the pipeline end to end
    ///
    /// Either the cache and the snapshot are both written, or an error is
    /// returned and no snapshot is written.
    pub async fn run(&self) -> Result<RunOutput, PipelineError> {
        let settings = &self.settings;
        let author_id = settings.author_id.trim();
        if author_id.is_empty() {
            return Err(PipelineError::Configuration("author_id is empty".to_string()));
        }

        tracing::info!(source = self.source.id(), author_id, "starting publication update");

        let stats = AuthorStatsFetcher::new(self.source.clone())
            .fetch(author_id)
            .await?;
        tracing::info!(
            citations = stats.total_citations,
            h_index = stats.h_index,
            i10_index = stats.i10_index,
            "fetched author statistics"
        );

        let works = WorksFetcher::new(self.source.clone())
            .with_page_delay(settings.page_delay)
            .with_pi_matcher(settings.pi.clone())
            .fetch_all(author_id, settings.max_results)
            .await?;

        let keys = unique_journal_keys(&works);
        let mut cache = MetricsCache::load(self.store.clone(), settings.metrics_cache_key.clone());
        let metrics = JournalMetricsResolver::new(self.metrics.clone())
            .with_delay(settings.lookup_delay)
            .with_max_concurrent(settings.max_concurrent_lookups)
            .resolve(&keys, &mut cache)
            .await?;

        let summary = RunSummary {
            publications: works.len(),
            with_pi: works.iter().filter(|w| w.pi_author_index.is_some()).count(),
            journal_keys: keys.len(),
            metrics,
        };

        let snapshot = PublicationsSnapshot::new(author_id, self.source.id(), stats, works);
        write_snapshot(&*self.store, &settings.snapshot_key, &snapshot)?;

        tracing::info!(
            publications = summary.publications,
            journal_keys = summary.journal_keys,
            resolved = summary.metrics.resolved,
            failed = summary.metrics.failed,
            "publication update complete"
        );

        Ok(RunOutput {
            snapshot,
            cache,
            summary,
        })
    }
}

/// Serialize and write a snapshot
pub fn write_snapshot(
    store: &dyn BlobStore,
    key: &str,
    snapshot: &PublicationsSnapshot,
) -> Result<(), PipelineError> {
    let text = snapshot.to_json()?;
    store
        .write_text(key, &text)
        .map_err(|source| PipelineError::Store {
            key: key.to_string(),
            source,
        })?;
    tracing::info!(key, publications = snapshot.publications.len(), "wrote snapshot");
    Ok(())
}

/// Read a previously written snapshot
pub fn read_snapshot(store: &dyn BlobStore, key: &str) -> Result<PublicationsSnapshot, PipelineError> {
    let text = store
        .read_text(key)
        .map_err(|source| PipelineError::Store {
            key: key.to_string(),
            source,
        })?
        .ok_or_else(|| PipelineError::MissingSnapshot(key.to_string()))?;
    Ok(PublicationsSnapshot::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorStats;
    use crate::sources::mock::make_work;
    use crate::sources::{MockMetricsSource, MockSource};
    use crate::utils::MemoryStore;

    fn pipeline(source: MockSource, metrics: MockMetricsSource, store: Arc<MemoryStore>) -> Pipeline {
        Pipeline::new(
            Arc::new(source),
            Arc::new(metrics),
            store,
            PipelineSettings::new("A42"),
        )
    }

    #[tokio::test]
    async fn test_run_writes_snapshot_and_cache() {
        let store = Arc::new(MemoryStore::new());
        let source = MockSource::new()
            .with_stats(AuthorStats::new("EK Lee", 120, 6, 4))
            .with_pages(vec![vec![
                make_work("A", 2024, 30, "Journal X"),
                make_work("B", 2022, 3, "Journal X 10 (2), 55"),
            ]]);
        let metrics = MockMetricsSource::new().with_metric("journal x", "Journal X", Some(4.2));

        let output = pipeline(source, metrics, store.clone()).run().await.unwrap();

        assert_eq!(output.summary.publications, 2);
        assert_eq!(output.summary.journal_keys, 1);
        assert_eq!(output.summary.metrics.resolved, 1);
        assert_eq!(store.keys(), vec!["journal_metrics.json", "publications.json"]);

        let snapshot = read_snapshot(&*store, "publications.json").unwrap();
        assert_eq!(snapshot.author_id, "A42");
        assert_eq!(snapshot.source, "mock");
        assert_eq!(snapshot.stats.total_citations, 120);
        assert_eq!(snapshot.publications.len(), 2);
    }

    #[tokio::test]
    async fn test_stats_failure_is_fatal_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let source = MockSource::new().with_page_sizes(&[3]).failing_stats();

        let result = pipeline(source, MockMetricsSource::new(), store.clone()).run().await;

        assert!(matches!(result, Err(PipelineError::AuthorStats(_))));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let source = MockSource::new().with_page_sizes(&[100, 5]).failing_page(0);

        let result = pipeline(source, MockMetricsSource::new(), store.clone()).run().await;

        assert!(matches!(result, Err(PipelineError::WorksPage { offset: 0, .. })));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_empty_author_id() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::new(
            Arc::new(MockSource::new()),
            Arc::new(MockMetricsSource::new()),
            store,
            PipelineSettings::new(" "),
        );
        assert!(matches!(
            pipeline.run().await,
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_read_missing_snapshot() {
        let store = MemoryStore::new();
        assert!(matches!(
            read_snapshot(&store, "publications.json"),
            Err(PipelineError::MissingSnapshot(_))
        ));
    }
}
