//! Enriched, grouped view of a snapshot consumed by the renderer.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::{AuthorStats, JournalMetric, PublicationsSnapshot, WorkRecord};

/// Label of the group collecting works without a known year
pub const OTHER_YEAR_LABEL: &str = "Other";

/// Grouping key for works
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearLabel {
    Year(u32),
    Other,
}

impl YearLabel {
    /// Label for a work year; 0 goes to the "Other" bucket
    pub fn for_year(year: u32) -> Self {
        if year > 0 {
            YearLabel::Year(year)
        } else {
            YearLabel::Other
        }
    }
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearLabel::Year(y) => write!(f, "{}", y),
            YearLabel::Other => f.write_str(OTHER_YEAR_LABEL),
        }
    }
}

impl Serialize for YearLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How a work's journal metric was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    /// Cache holds a metric for the journal
    Resolved,
    /// Journal was looked up and nothing was found
    NotFound,
    /// Journal was never looked up (or the work has no venue)
    NotLookedUp,
}

/// A work joined with its journal metric and curated annotations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedWork {
    #[serde(flatten)]
    pub work: WorkRecord,

    /// Canonical journal key computed from the venue
    pub normalized_venue: String,

    /// Resolved metric, if any
    pub metric: Option<JournalMetric>,

    /// Lookup state behind `metric`
    pub metric_status: MetricStatus,

    /// Curated corresponding-author mark
    pub corresponding: bool,
}

impl EnrichedWork {
    /// Impact figure, if one was resolved
    pub fn impact(&self) -> Option<f64> {
        self.metric.as_ref().and_then(|m| m.impact)
    }
}

/// Works sharing a year label, ordered by citations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub label: YearLabel,
    pub works: Vec<EnrichedWork>,
}

impl YearGroup {
    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

/// The final ordered structure handed to presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub author_id: String,
    pub source: String,
    pub stats: AuthorStats,
    pub publication_count: usize,
    pub groups: Vec<YearGroup>,
}

impl Report {
    /// Attach grouped works to the snapshot metadata they were derived from
    pub fn new(snapshot: &PublicationsSnapshot, groups: Vec<YearGroup>) -> Self {
        Self {
            generated_at: snapshot.generated_at,
            author_id: snapshot.author_id.clone(),
            source: snapshot.source.clone(),
            stats: snapshot.stats.clone(),
            publication_count: snapshot.publications.len(),
            groups,
        }
    }

    /// Group labels in display order
    pub fn labels(&self) -> Vec<YearLabel> {
        self.groups.iter().map(|g| g.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_label() {
        assert_eq!(YearLabel::for_year(2023), YearLabel::Year(2023));
        assert_eq!(YearLabel::for_year(0), YearLabel::Other);
        assert_eq!(YearLabel::Year(2023).to_string(), "2023");
        assert_eq!(YearLabel::Other.to_string(), "Other");
        assert_eq!(serde_json::to_string(&YearLabel::Other).unwrap(), "\"Other\"");
    }
}
