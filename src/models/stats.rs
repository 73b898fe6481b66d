//! Author-level citation statistics.

use serde::{Deserialize, Serialize};

/// Summary statistics for the profiled author, fetched once per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStats {
    /// Author display name as reported by the source
    #[serde(default)]
    pub display_name: String,

    /// Total citations across all works
    #[serde(default)]
    pub total_citations: u64,

    /// h-index
    #[serde(default)]
    pub h_index: u32,

    /// i10-index
    #[serde(default)]
    pub i10_index: u32,
}

impl AuthorStats {
    pub fn new(display_name: impl Into<String>, total_citations: u64, h_index: u32, i10_index: u32) -> Self {
        Self {
            display_name: display_name.into(),
            total_citations,
            h_index,
            i10_index,
        }
    }
}
