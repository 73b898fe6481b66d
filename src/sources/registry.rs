//! Registry of the configured bibliographic backends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{BibliographicSource, OpenAlexSource, ScholarProfileSource, SourceError};

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const AUTHOR_STATS = 1 << 0;
        const WORKS = 1 << 1;
        const WORK_DETAIL = 1 << 2;
    }
}

/// Backends selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    OpenAlex,
    Scholar,
}

impl SourceKind {
    /// Registry id of the backend
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::OpenAlex => "openalex",
            SourceKind::Scholar => "scholar",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Registry for all available bibliographic sources
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn BibliographicSource>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in backend
    pub fn with_defaults(openalex: OpenAlexSource, scholar: ScholarProfileSource) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(openalex));
        registry.register(Arc::new(scholar));
        registry
    }

    /// Register a new source
    pub fn register(&mut self, source: Arc<dyn BibliographicSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn BibliographicSource>> {
        self.sources.get(id)
    }

    /// Get a source by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<Arc<dyn BibliographicSource>, SourceError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "Source '{}' not registered (available: {})",
                    id,
                    self.ids().join(", ")
                ))
            })
    }

    /// Get all source IDs, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sources.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
