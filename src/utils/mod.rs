//! Utility modules supporting the publication pipeline.
//!
//! - [`HttpClient`]: HTTP client with a per-request deadline and transport retries
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff on transient errors
//! - [`BlobStore`]: get/set text blobs by key ([`FileStore`], [`MemoryStore`])
//! - [`MetricsCache`]: persistent journal metrics cache
//! - [`normalize_venue`]: canonical journal key for a venue string
//! - [`PiMatcher`] / [`TitleMatcher`]: curated matching policies
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use lab_publications::utils::{with_retry, RetryConfig};
//! use lab_publications::SourceError;
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_attempts(3);
//! let result = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod http;
mod matching;
mod normalize;
mod retry;
mod store;

pub use cache::{CacheResult, MetricsCache, DEFAULT_CACHE_KEY};
pub use http::{default_user_agent, HttpClient, DEFAULT_TIMEOUT};
pub use matching::{short_id, MatchStrategy, PiMatcher, TitleMatcher};
pub use normalize::normalize_venue;
pub use retry::{with_retry, RetryConfig, TransientError};
pub use store::{BlobStore, FileStore, MemoryStore};
