//! Configuration management.
//!
//! Settings are layered: serde defaults, then a TOML file, then environment
//! variables prefixed with `LAB_PUBS_` (nested keys joined with `__`, e.g.
//! `LAB_PUBS_PACING__LOOKUP_DELAY_MS=200`).

mod file_config;

pub use file_config::{ConfigFileError, DEFAULT_CONFIG_FILE};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::{PipelineError, PipelineSettings};
use crate::sources::{
    BibliographicSource, OpenAlexSource, ScholarProfileSource, SourceError, SourceKind,
    SourceRegistry,
};
use crate::utils::{
    default_user_agent, FileStore, HttpClient, MatchStrategy, PiMatcher, RetryConfig,
    TitleMatcher, DEFAULT_CACHE_KEY,
};

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "LAB_PUBS";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Author identifier at the selected source (OpenAlex author id or
    /// Scholar user id)
    #[serde(default)]
    pub author_id: Option<String>,

    /// Bibliographic backend
    #[serde(default)]
    pub source: SourceKind,

    /// Maximum number of works to fetch
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// How to recognize the lab PI among co-authors
    #[serde(default)]
    pub pi: PiConfig,

    /// Curated annotations
    #[serde(default)]
    pub annotations: AnnotationsConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// OpenAlex settings
    #[serde(default)]
    pub openalex: OpenAlexConfig,

    /// Google Scholar settings
    #[serde(default)]
    pub scholar: ScholarConfig,

    /// Request pacing
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Rendered page settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author_id: None,
            source: SourceKind::default(),
            max_results: default_max_results(),
            pi: PiConfig::default(),
            annotations: AnnotationsConfig::default(),
            output: OutputConfig::default(),
            http: HttpConfig::default(),
            openalex: OpenAlexConfig::default(),
            scholar: ScholarConfig::default(),
            pacing: PacingConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

fn default_max_results() -> usize {
    200
}

/// PI identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiConfig {
    /// Exact name spellings, e.g. "EK Lee", "E.K. Lee"
    #[serde(default)]
    pub name_variants: Vec<String>,

    /// Persistent author ids (OpenAlex)
    #[serde(default)]
    pub author_ids: Vec<String>,
}

/// Curated annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationsConfig {
    /// Titles (or title fragments) of papers where the PI is corresponding author
    #[serde(default)]
    pub corresponding_titles: Vec<String>,

    /// How titles are compared
    #[serde(default)]
    pub match_strategy: MatchStrategy,
}

/// Output locations, relative to `directory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    #[serde(default = "default_html_file")]
    pub html_file: String,

    #[serde(default = "default_metrics_cache_file")]
    pub metrics_cache_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            snapshot_file: default_snapshot_file(),
            html_file: default_html_file(),
            metrics_cache_file: default_metrics_cache_file(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_snapshot_file() -> String {
    "publications.json".to_string()
}

fn default_html_file() -> String {
    "index.html".to_string()
}

fn default_metrics_cache_file() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request deadline
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

/// OpenAlex settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAlexConfig {
    /// Email for the polite pool (falls back to `OPENALEX_EMAIL`)
    #[serde(default)]
    pub mailto: Option<String>,

    /// Premium API key (falls back to `OPENALEX_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root override
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Google Scholar settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarConfig {
    /// Host override
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Request pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay between works pages
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Minimum spacing between journal lookups
    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,

    /// Journal lookups in flight at once
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            lookup_delay_ms: default_lookup_delay_ms(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_lookup_delay_ms() -> u64 {
    150
}

fn default_max_concurrent_lookups() -> usize {
    1
}

/// Rendered page settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
        }
    }
}

fn default_report_title() -> String {
    "Publications".to_string()
}

impl Config {
    /// Author id, or a configuration error if none is set
    pub fn require_author_id(&self) -> Result<&str, PipelineError> {
        self.author_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PipelineError::Configuration(
                    "author_id is not set (config file or LAB_PUBS_AUTHOR_ID)".to_string(),
                )
            })
    }

    /// HTTP client honoring the transport settings
    pub fn http_client(&self) -> Result<HttpClient, SourceError> {
        let timeout = Duration::from_secs(self.http.timeout_seconds.max(1));
        let user_agent = self
            .http
            .user_agent
            .as_deref()
            .unwrap_or(default_user_agent());
        HttpClient::with_settings(
            user_agent,
            timeout,
            RetryConfig::default().max_attempts(self.http.max_attempts),
        )
    }

    /// OpenAlex client; also the journal metrics service for every backend
    pub fn openalex_source(&self, http: HttpClient) -> OpenAlexSource {
        let mailto = self
            .openalex
            .mailto
            .clone()
            .or_else(|| std::env::var("OPENALEX_EMAIL").ok());
        let api_key = self
            .openalex
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENALEX_API_KEY").ok());

        let source = OpenAlexSource::new(http)
            .with_email(mailto)
            .with_api_key(api_key);
        match self.openalex.base_url {
            Some(ref base) => source.with_base_url(base.as_str()),
            None => source,
        }
    }

    /// Registry of every backend, with host overrides applied
    pub fn source_registry(&self, http: &HttpClient) -> SourceRegistry {
        let scholar = ScholarProfileSource::new(http.clone());
        let scholar = match self.scholar.base_url {
            Some(ref base) => scholar.with_base_url(base.as_str()),
            None => scholar,
        };
        SourceRegistry::with_defaults(self.openalex_source(http.clone()), scholar)
    }

    /// The configured backend
    pub fn bibliographic_source(
        &self,
        http: &HttpClient,
    ) -> Result<Arc<dyn BibliographicSource>, SourceError> {
        self.source_registry(http).get_required(self.source.id())
    }

    pub fn pi_matcher(&self) -> PiMatcher {
        PiMatcher::new(self.pi.name_variants.clone(), self.pi.author_ids.clone())
    }

    pub fn title_matcher(&self) -> TitleMatcher {
        TitleMatcher::new(
            self.annotations.corresponding_titles.clone(),
            self.annotations.match_strategy,
        )
    }

    /// Blob store rooted at the output directory
    pub fn output_store(&self) -> FileStore {
        FileStore::new(&self.output.directory)
    }

    /// Settings for one pipeline run
    pub fn pipeline_settings(&self) -> Result<PipelineSettings, PipelineError> {
        let author_id = self.require_author_id()?.to_string();
        if self.max_results == 0 {
            return Err(PipelineError::Configuration(
                "max_results must be at least 1".to_string(),
            ));
        }

        Ok(PipelineSettings {
            author_id,
            max_results: self.max_results,
            page_delay: Duration::from_millis(self.pacing.page_delay_ms),
            lookup_delay: Duration::from_millis(self.pacing.lookup_delay_ms),
            max_concurrent_lookups: self.pacing.max_concurrent_lookups.max(1),
            snapshot_key: self.output.snapshot_file.clone(),
            metrics_cache_key: self.output.metrics_cache_file.clone(),
            pi: self.pi_matcher(),
        })
    }
}

/// Load configuration from defaults, a TOML file and the environment
///
/// With `path` the file must exist; without it the default locations from
/// [`find_config_file`] are tried and skipped when absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            if let Some(found) = find_config_file() {
                tracing::debug!(path = %found.display(), "using config file");
                builder = builder.add_source(config::File::from(found.as_path()));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Checks `./lab-publications.toml`, then `<config dir>/lab-publications/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}
