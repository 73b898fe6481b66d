//! Work model representing one published item from any bibliographic source.

use serde::{Deserialize, Serialize};

/// Title used when a source omits one
pub const UNTITLED: &str = "Untitled";

/// Identifiers a source attaches to a work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkIds {
    /// Source-specific work identifier (OpenAlex work id, Scholar citation id, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Digital Object Identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Path or id of the per-item detail endpoint, when the source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_id: Option<String>,
}

/// A published item as fetched from a bibliographic source
///
/// Numeric fields default to 0 instead of being absent so grouping and
/// sorting stay total. A year of 0 means the year is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Work title
    pub title: String,

    /// Author names in publication order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Venue (journal, conference, repository) as reported by the source
    #[serde(default)]
    pub venue: String,

    /// Publication year, 0 when unknown
    #[serde(default)]
    pub year: u32,

    /// Citation count
    #[serde(default)]
    pub citations: u32,

    /// Landing page or DOI link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Source-provided journal identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_key: Option<String>,

    /// Index into `authors` of the lab PI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pi_author_index: Option<usize>,

    /// Source identifiers
    #[serde(default)]
    pub ids: WorkIds,

    /// Persistent author ids aligned with `authors`, when the source supplies them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_ids: Vec<Option<String>>,
}

impl WorkRecord {
    /// Create a work with only a title; every other field takes its default
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            venue: String::new(),
            year: 0,
            citations: 0,
            link: None,
            journal_key: None,
            pi_author_index: None,
            ids: WorkIds::default(),
            author_ids: Vec::new(),
        }
    }

    /// Whether the title or the author list carries a truncation marker
    pub fn is_truncated(&self) -> bool {
        has_truncation_marker(&self.title) || self.authors.iter().any(|a| has_truncation_marker(a))
    }
}

/// Check for an ellipsis character or a literal `...`
pub fn has_truncation_marker(text: &str) -> bool {
    text.contains('\u{2026}') || text.contains("...")
}

/// Split a delimited author string into an ordered list of names
///
/// Accepts comma or semicolon separated lists. Empty segments are dropped.
pub fn parse_author_list(raw: &str) -> Vec<String> {
    let delimiter = if raw.contains(';') { ';' } else { ',' };
    raw.split(delimiter)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Builder used by sources so that field defaulting lives in one place
#[derive(Debug, Clone)]
pub struct WorkRecordBuilder {
    work: WorkRecord,
}

impl WorkRecordBuilder {
    /// Start a work; a missing or blank title becomes "Untitled"
    pub fn new(title: Option<&str>) -> Self {
        let title = title
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED);
        Self {
            work: WorkRecord::new(title),
        }
    }

    /// Set authors from an already split list
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.work.authors = authors;
        self
    }

    /// Set authors from a delimited string
    pub fn authors_str(mut self, authors: &str) -> Self {
        self.work.authors = parse_author_list(authors);
        self
    }

    /// Set persistent author ids aligned with the author list
    pub fn author_ids(mut self, ids: Vec<Option<String>>) -> Self {
        self.work.author_ids = ids;
        self
    }

    /// Set venue
    pub fn venue(mut self, venue: Option<&str>) -> Self {
        self.work.venue = venue.map(|v| v.trim().to_string()).unwrap_or_default();
        self
    }

    /// Set year; negative or missing values become 0
    pub fn year(mut self, year: Option<i64>) -> Self {
        self.work.year = year
            .and_then(|y| u32::try_from(y).ok())
            .unwrap_or(0);
        self
    }

    /// Set year from free text; anything that is not a plain number becomes 0
    pub fn year_str(self, year: &str) -> Self {
        let parsed = year.trim().parse::<i64>().ok();
        self.year(parsed)
    }

    /// Set citation count; negative or missing values become 0
    pub fn citations(mut self, count: Option<i64>) -> Self {
        self.work.citations = count
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(0);
        self
    }

    /// Set link
    pub fn link(mut self, link: Option<String>) -> Self {
        self.work.link = link.filter(|l| !l.is_empty());
        self
    }

    /// Set source journal identifier
    pub fn journal_key(mut self, key: Option<String>) -> Self {
        self.work.journal_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Set identifiers
    pub fn ids(mut self, ids: WorkIds) -> Self {
        self.work.ids = ids;
        self
    }

    /// Build the WorkRecord
    pub fn build(self) -> WorkRecord {
        self.work
    }
}
