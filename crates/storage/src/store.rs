//! Persistence backends for the render cache.
//!
//! The cache is persisted wholesale: `load` returns every entry and `save`
//! replaces the stored set. The on-disk format is a single JSON object
//! mapping content hashes to `{"image": "<base64>"}`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use traffic_common::{MapError, MapResult, RenderArtifact};

/// Content hash → artifact. Ordered so saved files are stable.
pub type CacheEntries = BTreeMap<String, RenderArtifact>;

/// Backend that stores the full set of cache entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read every stored entry. A store that has never been saved is empty.
    async fn load(&self) -> MapResult<CacheEntries>;

    /// Replace the stored entries.
    async fn save(&self, entries: &CacheEntries) -> MapResult<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Cache persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn load(&self) -> MapResult<CacheEntries> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cache file yet, starting empty");
                return Ok(CacheEntries::new());
            }
            Err(e) => {
                return Err(MapError::StorageError(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            warn!(path = %self.path.display(), "Cache file is empty, starting empty");
            return Ok(CacheEntries::new());
        }

        serde_json::from_slice(&content).map_err(|e| {
            MapError::SerializationError(format!(
                "cache file {} is not a valid cache: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, entries: &CacheEntries) -> MapResult<()> {
        let data = serde_json::to_vec(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MapError::StorageError(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        // Write a sibling file and rename it over the target so a crash never
        // leaves a truncated cache behind.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &data).await.map_err(|e| {
            MapError::StorageError(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            MapError::StorageError(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            bytes = data.len(),
            "Cache file written"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store, used in tests and for runs without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<CacheEntries>,
    saves: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with entries, as if saved by an earlier run.
    pub fn with_entries(entries: CacheEntries) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: AtomicU64::new(0),
        }
    }

    /// Number of completed `save` calls.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Copy of the currently stored entries.
    pub async fn snapshot(&self) -> CacheEntries {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self) -> MapResult<CacheEntries> {
        Ok(self.entries.lock().await.clone())
    }

    async fn save(&self, entries: &CacheEntries) -> MapResult<()> {
        *self.entries.lock().await = entries.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> CacheEntries {
        let mut entries = CacheEntries::new();
        entries.insert("ab".repeat(32), RenderArtifact::from_image_bytes(b"png"));
        entries
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("cache.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("cache.json"));
        store.save(&entries()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), entries());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = JsonFileStore::new(&path);
        store.save(&entries()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["ab".repeat(32)]["image"], "cG5n");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load().await,
            Err(MapError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "\n").unwrap();
        assert!(JsonFileStore::new(&path).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        store.save(&entries()).await.unwrap();
        store.save(&entries()).await.unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().await.unwrap().len(), 1);
    }
}
