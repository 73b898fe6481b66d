//! Publication snapshot written at the end of every successful run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorStats, WorkRecord};

/// Everything a renderer needs to rebuild the publication page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationsSnapshot {
    /// When the snapshot was produced
    pub generated_at: DateTime<Utc>,

    /// Author identifier the works were fetched for
    pub author_id: String,

    /// Source id that provided the data (e.g. "openalex")
    #[serde(default)]
    pub source: String,

    /// Author statistics
    pub stats: AuthorStats,

    /// Works in fetch order
    pub publications: Vec<WorkRecord>,
}

impl PublicationsSnapshot {
    pub fn new(
        author_id: impl Into<String>,
        source: impl Into<String>,
        stats: AuthorStats,
        publications: Vec<WorkRecord>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            author_id: author_id.into(),
            source: source.into(),
            stats,
            publications,
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot previously written by [`PublicationsSnapshot::to_json`]
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
