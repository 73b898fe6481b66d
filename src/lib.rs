//! # Lab Publications
//!
//! Keeps a lab's publication listing up to date by pulling an author's works
//! and citation statistics from a bibliographic API, joining them with journal
//! impact metrics and curated annotations, and producing a JSON snapshot plus a
//! static HTML report.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (WorkRecord, AuthorStats, JournalMetric, Report)
//! - [`sources`]: Bibliographic backends behind the [`BibliographicSource`] trait
//! - [`pipeline`]: Works fetching, metric resolution, aggregation and the run orchestrator
//! - [`render`]: HTML rendering of an aggregated report
//! - [`utils`]: HTTP client, retries, blob storage, venue normalization and matching
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{AuthorStats, JournalMetric, WorkRecord};
pub use pipeline::{Pipeline, PipelineError};
pub use sources::{BibliographicSource, JournalMetricsSource, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
