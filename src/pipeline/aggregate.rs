//! Grouping, ranking and enrichment of fetched works.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    EnrichedWork, MetricStatus, PublicationsSnapshot, Report, WorkRecord, YearGroup, YearLabel,
};
use crate::utils::{normalize_venue, CacheResult, MetricsCache, TitleMatcher};

/// Unique, non-empty canonical journal keys of `works`
pub fn unique_journal_keys(works: &[WorkRecord]) -> BTreeSet<String> {
    works
        .iter()
        .map(|w| normalize_venue(&w.venue))
        .filter(|key| !key.is_empty())
        .collect()
}

/// Attach the cached metric and curated annotations to a work
pub fn enrich(work: WorkRecord, cache: &MetricsCache, annotations: &TitleMatcher) -> EnrichedWork {
    let normalized_venue = normalize_venue(&work.venue);
    let (metric, metric_status) = if normalized_venue.is_empty() {
        (None, MetricStatus::NotLookedUp)
    } else {
        match cache.get(&normalized_venue) {
            CacheResult::Hit(metric) => (Some(metric.clone()), MetricStatus::Resolved),
            CacheResult::NotFound => (None, MetricStatus::NotFound),
            CacheResult::Miss => (None, MetricStatus::NotLookedUp),
        }
    };
    let corresponding = annotations.matches(&work.title);

    EnrichedWork {
        work,
        normalized_venue,
        metric,
        metric_status,
        corresponding,
    }
}

/// Group works by year, newest first, with unknown years last
///
/// Within a group works are ordered by citations, descending. The sort is
/// stable, so ties keep fetch order and repeated runs give the same output.
pub fn aggregate(
    works: &[WorkRecord],
    cache: &MetricsCache,
    annotations: &TitleMatcher,
) -> Vec<YearGroup> {
    let mut by_year: BTreeMap<Reverse<u32>, Vec<EnrichedWork>> = BTreeMap::new();
    let mut unknown: Vec<EnrichedWork> = Vec::new();

    for work in works {
        let enriched = enrich(work.clone(), cache, annotations);
        match YearLabel::for_year(work.year) {
            YearLabel::Year(year) => by_year.entry(Reverse(year)).or_default().push(enriched),
            YearLabel::Other => unknown.push(enriched),
        }
    }

    let mut groups: Vec<YearGroup> = by_year
        .into_iter()
        .map(|(Reverse(year), works)| YearGroup {
            label: YearLabel::Year(year),
            works,
        })
        .collect();
    if !unknown.is_empty() {
        groups.push(YearGroup {
            label: YearLabel::Other,
            works: unknown,
        });
    }

    for group in &mut groups {
        group
            .works
            .sort_by(|a, b| b.work.citations.cmp(&a.work.citations));
    }

    groups
}

impl Report {
    /// Re-derive the grouped, enriched view of a snapshot
    pub fn from_snapshot(
        snapshot: &PublicationsSnapshot,
        cache: &MetricsCache,
        annotations: &TitleMatcher,
    ) -> Self {
        let groups = aggregate(&snapshot.publications, cache, annotations);
        Report::new(snapshot, groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorStats, JournalMetric};
    use crate::sources::mock::make_work;
    use crate::utils::{MatchStrategy, MemoryStore, DEFAULT_CACHE_KEY};
    use std::sync::Arc;

    fn empty_cache() -> MetricsCache {
        MetricsCache::load(Arc::new(MemoryStore::new()), DEFAULT_CACHE_KEY)
    }

    #[test]
    fn test_group_and_sort_order() {
        let works = vec![
            make_work("w2021", 2021, 5, ""),
            make_work("w2023-first", 2023, 10, ""),
            make_work("w-unknown", 0, 1, ""),
            make_work("w2023-second", 2023, 10, ""),
        ];

        let groups = aggregate(&works, &empty_cache(), &TitleMatcher::default());

        let labels: Vec<String> = groups.iter().map(|g| g.label.to_string()).collect();
        assert_eq!(labels, vec!["2023", "2021", "Other"]);

        let titles: Vec<&str> = groups[0].works.iter().map(|w| w.work.title.as_str()).collect();
        assert_eq!(titles, vec!["w2023-first", "w2023-second"]);
    }

    #[test]
    fn test_within_year_by_citations_descending() {
        let works = vec![
            make_work("low", 2022, 0, ""),
            make_work("high", 2022, 40, ""),
            make_work("mid", 2022, 7, ""),
            make_work("also-zero", 2022, 0, ""),
        ];

        let groups = aggregate(&works, &empty_cache(), &TitleMatcher::default());
        let titles: Vec<&str> = groups[0].works.iter().map(|w| w.work.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid", "low", "also-zero"]);
    }

    #[test]
    fn test_other_bucket_absent_without_unknown_years() {
        let works = vec![make_work("a", 2020, 0, "")];
        let groups = aggregate(&works, &empty_cache(), &TitleMatcher::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, YearLabel::Year(2020));
    }

    #[test]
    fn test_enrichment_metric_states() {
        let mut cache = empty_cache();
        cache.put("journal x", Some(JournalMetric::new("Journal X", Some(4.2))));
        cache.put("lab notes", None);

        let resolved = enrich(make_work("a", 2024, 0, "Journal X 10 (2), 55"), &cache, &TitleMatcher::default());
        assert_eq!(resolved.metric_status, MetricStatus::Resolved);
        assert_eq!(resolved.impact(), Some(4.2));
        assert_eq!(resolved.normalized_venue, "journal x");

        let not_found = enrich(make_work("b", 2024, 0, "Lab Notes"), &cache, &TitleMatcher::default());
        assert_eq!(not_found.metric_status, MetricStatus::NotFound);
        assert!(not_found.metric.is_none());

        let never = enrich(make_work("c", 2024, 0, "New Journal"), &cache, &TitleMatcher::default());
        assert_eq!(never.metric_status, MetricStatus::NotLookedUp);

        let no_venue = enrich(make_work("d", 2024, 0, ""), &cache, &TitleMatcher::default());
        assert_eq!(no_venue.metric_status, MetricStatus::NotLookedUp);
        assert_eq!(no_venue.normalized_venue, "");
    }

    #[test]
    fn test_corresponding_annotation() {
        let annotations = TitleMatcher::new(
            vec!["high-entropy oxide cathodes".to_string()],
            MatchStrategy::SubstringEitherWay,
        );
        let works = vec![
            make_work("High-Entropy Oxide Cathodes for Sodium Batteries", 2024, 3, ""),
            make_work("Unrelated", 2024, 2, ""),
        ];

        let groups = aggregate(&works, &empty_cache(), &annotations);
        assert!(groups[0].works[0].corresponding);
        assert!(!groups[0].works[1].corresponding);
    }

    #[test]
    fn test_enrichment_does_not_touch_fetched_fields() {
        let work = make_work("Paper", 2021, 9, "Journal X 10 (2), 55");
        let enriched = enrich(work.clone(), &empty_cache(), &TitleMatcher::default());
        assert_eq!(enriched.work, work);
    }

    #[test]
    fn test_unique_keys() {
        let works = vec![
            make_work("a", 2024, 30, "Journal X"),
            make_work("b", 2022, 3, "Journal X 10 (2), 55"),
            make_work("c", 2022, 3, ""),
        ];
        let keys = unique_journal_keys(&works);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["journal x"]);
    }

    #[test]
    fn test_report_from_snapshot() {
        let snapshot = PublicationsSnapshot::new(
            "A42",
            "openalex",
            AuthorStats::new("EK Lee", 120, 6, 4),
            vec![make_work("a", 2024, 30, "Journal X"), make_work("b", 0, 0, "")],
        );

        let report = Report::from_snapshot(&snapshot, &empty_cache(), &TitleMatcher::default());

        assert_eq!(report.publication_count, 2);
        assert_eq!(report.labels(), vec![YearLabel::Year(2024), YearLabel::Other]);
        assert_eq!(report.stats.total_citations, 120);
        assert_eq!(report.generated_at, snapshot.generated_at);
    }
}
