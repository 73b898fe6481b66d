//! Blob storage for snapshots, reports and the journal metrics cache.
//!
//! Keys are relative paths. [`FileStore`] writes atomically through a
//! temporary file in the target directory, so readers never observe a
//! half-written snapshot.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Get/set text blobs by key
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Read a blob; `Ok(None)` when it does not exist
    fn read_text(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace a blob
    fn write_text(&self, key: &str, text: &str) -> io::Result<()>;
}

/// Store rooted at a directory on the local file system
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Full path of a key
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FileStore {
    fn read_text(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_text(&self, key: &str, text: &str) -> io::Result<()> {
        let path = self.path_of(key);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "wrote blob");
        Ok(())
    }
}

/// In-memory store, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored
    pub fn keys(&self) -> Vec<String> {
        let guard = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryStore {
    fn read_text(&self, key: &str) -> io::Result<Option<String>> {
        let guard = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get(key).cloned())
    }

    fn write_text(&self, key: &str, text: &str) -> io::Result<()> {
        let mut guard = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.to_string(), text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("docs"));

        assert_eq!(store.read_text("publications.json").unwrap(), None);

        store.write_text("publications.json", "{}").unwrap();
        assert_eq!(
            store.read_text("publications.json").unwrap(),
            Some("{}".to_string())
        );

        store.write_text("publications.json", "[1]").unwrap();
        assert_eq!(
            store.read_text("publications.json").unwrap(),
            Some("[1]".to_string())
        );
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.write_text("cache.json", "{}").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name(), "cache.json");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.write_text("b", "2").unwrap();
        store.write_text("a", "1").unwrap();
        assert_eq!(store.read_text("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.read_text("missing").unwrap(), None);
        assert_eq!(store.keys(), vec!["a", "b"]);
    }
}
