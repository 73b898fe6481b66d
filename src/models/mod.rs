//! Core data models for works, author statistics and journal metrics.

mod metric;
mod report;
mod snapshot;
mod stats;
mod work;

pub use metric::{round_one_decimal, JournalMetric};
pub use report::{EnrichedWork, MetricStatus, Report, YearGroup, YearLabel, OTHER_YEAR_LABEL};
pub use snapshot::PublicationsSnapshot;
pub use stats::AuthorStats;
pub use work::{
    has_truncation_marker, parse_author_list, WorkIds, WorkRecord, WorkRecordBuilder, UNTITLED,
};
