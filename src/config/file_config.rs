//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! author_id = "A5023888391"
//! source = "openalex"          # or "scholar"
//! max_results = 200
//!
//! [pi]
//! name_variants = ["EK Lee", "E.K. Lee", "E Lee"]
//! author_ids = ["A5023888391"]
//!
//! [annotations]
//! corresponding_titles = ["High-entropy oxide cathodes"]
//! match_strategy = "substring_either_way"
//!
//! [output]
//! directory = "docs"
//! snapshot_file = "publications.json"
//! html_file = "index.html"
//! metrics_cache_file = "journal_metrics.json"
//!
//! [http]
//! timeout_seconds = 30
//! max_attempts = 3
//!
//! [openalex]
//! mailto = "lab@example.org"
//!
//! [pacing]
//! page_delay_ms = 1000
//! lookup_delay_ms = 150
//! max_concurrent_lookups = 1
//!
//! [report]
//! title = "Lab Publications"
//! ```

use std::path::Path;

use super::Config;

/// File name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lab-publications.toml";

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn load_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
