//! Journal metric resolution against the persistent cache.

use futures_util::stream::{self, StreamExt};
use governor::{Quota, RateLimiter};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::PipelineError;
use crate::sources::JournalMetricsSource;
use crate::utils::MetricsCache;

/// Outcome counters of one resolution batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    /// Keys already in the cache, including `null` entries
    pub cached: usize,
    /// Lookups that returned a metric
    pub resolved: usize,
    /// Lookups without a match
    pub not_found: usize,
    /// Lookups that failed and were recorded as `null`
    pub failed: usize,
}

impl ResolveSummary {
    /// Number of lookups issued
    pub fn lookups(&self) -> usize {
        self.resolved + self.not_found + self.failed
    }
}

/// Fills the metrics cache for keys that were never looked up
///
/// Lookups are spaced by a token bucket with one token per `delay`, so the
/// request rate stays the same whatever the concurrency. A failed lookup is
/// recorded as `null` and never aborts the batch. The cache is saved once,
/// after the whole batch.
#[derive(Debug, Clone)]
pub struct JournalMetricsResolver {
    source: Arc<dyn JournalMetricsSource>,
    delay: Duration,
    max_concurrent: usize,
}

impl JournalMetricsResolver {
    pub fn new(source: Arc<dyn JournalMetricsSource>) -> Self {
        Self {
            source,
            delay: Duration::ZERO,
            max_concurrent: 1,
        }
    }

    /// Minimum spacing between lookups
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lookups in flight at once (at least 1)
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Resolve every key absent from `cache`, then save the cache
    pub async fn resolve(
        &self,
        keys: &BTreeSet<String>,
        cache: &mut MetricsCache,
    ) -> Result<ResolveSummary, PipelineError> {
        let mut summary = ResolveSummary::default();

        let pending: Vec<&str> = keys
            .iter()
            .map(String::as_str)
            .filter(|key| !key.is_empty())
            .filter(|key| {
                let known = cache.has(key);
                if known {
                    summary.cached += 1;
                }
                !known
            })
            .collect();

        tracing::info!(
            keys = keys.len(),
            cached = summary.cached,
            pending = pending.len(),
            "resolving journal metrics"
        );

        let limiter = Quota::with_period(self.delay).map(RateLimiter::direct);
        let limiter = limiter.as_ref();

        let results: Vec<_> = stream::iter(pending)
            .map(|key| async move {
                if let Some(limiter) = limiter {
                    limiter.until_ready().await;
                }
                (key, self.source.lookup_journal(key).await)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for (key, result) in results {
            match result {
                Ok(Some(metric)) => {
                    tracing::debug!(key, journal = %metric.display_name, impact = ?metric.impact, "resolved journal");
                    cache.put(key, Some(metric.rounded()));
                    summary.resolved += 1;
                }
                Ok(None) => {
                    tracing::debug!(key, "no journal match");
                    cache.put(key, None);
                    summary.not_found += 1;
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "journal lookup failed, recording no metric");
                    cache.put(key, None);
                    summary.failed += 1;
                }
            }
        }

        cache.save().map_err(|source| PipelineError::Store {
            key: cache.key().to_string(),
            source,
        })?;

        tracing::info!(
            resolved = summary.resolved,
            not_found = summary.not_found,
            failed = summary.failed,
            "journal metrics resolved"
        );
        Ok(summary)
    }
}
