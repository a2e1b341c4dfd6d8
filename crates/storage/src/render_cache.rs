//! Content-addressed cache of rendered artifacts.
//!
//! Requests are keyed by the SHA-256 of their canonical JSON, so two
//! payloads that differ only in formatting or key order share one entry.
//! Entries are never evicted; the full set is written through to the
//! [`CacheStore`] after every new render.
//!
//! Concurrency:
//! - entries sit behind an async `RwLock` (hits only take the read side)
//! - renders are single-flight per hash: concurrent callers for the same
//!   request wait on one render instead of repeating it
//! - writes to the store are serialized

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info};

use traffic_common::{content_hash, MapResult, RenderArtifact, RenderRequest};

use crate::store::{CacheEntries, CacheStore, JsonFileStore};

/// Whether a request was served from the cache or rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Rendered,
}

/// Result of [`RenderCache::get_or_render`].
#[derive(Debug, Clone)]
pub struct CachedRender {
    pub hash: String,
    pub artifact: RenderArtifact,
    pub outcome: CacheOutcome,
}

/// Counters for the render cache.
///
/// All fields are atomic so stats can be read while renders are running.
#[derive(Debug, Default)]
pub struct RenderCacheStats {
    /// Requests answered from stored entries
    pub hits: AtomicU64,
    /// Requests with no stored entry
    pub misses: AtomicU64,
    /// Renders actually executed
    pub renders: AtomicU64,
    /// Renders that returned an error
    pub failures: AtomicU64,
    /// Successful writes to the store
    pub persists: AtomicU64,
}

impl RenderCacheStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn persists(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }
}

/// Render cache service. Construct once with [`RenderCache::open`] and share
/// by reference (or `Arc`).
pub struct RenderCache {
    store: Arc<dyn CacheStore>,
    entries: RwLock<CacheEntries>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<RenderArtifact>>>>,
    persist_lock: Mutex<()>,
    stats: Arc<RenderCacheStats>,
}

impl RenderCache {
    /// Load the stored entries and wrap them in a cache.
    pub async fn open(store: Arc<dyn CacheStore>) -> MapResult<Self> {
        let entries = store.load().await?;
        info!(
            store = %store.describe(),
            entries = entries.len(),
            "Render cache loaded"
        );

        Ok(Self {
            store,
            entries: RwLock::new(entries),
            in_flight: Mutex::new(HashMap::new()),
            persist_lock: Mutex::new(()),
            stats: Arc::new(RenderCacheStats::default()),
        })
    }

    /// Open a cache persisted in a JSON file. A missing file is an empty cache.
    pub async fn open_file(path: impl Into<PathBuf>) -> MapResult<Self> {
        Self::open(Arc::new(JsonFileStore::new(path))).await
    }

    /// Stored artifact for a content hash.
    pub async fn lookup(&self, hash: &str) -> Option<RenderArtifact> {
        self.entries.read().await.get(hash).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn stats(&self) -> Arc<RenderCacheStats> {
        Arc::clone(&self.stats)
    }

    /// Return the stored artifact for `request`, or run `render`, store its
    /// result and persist the cache.
    ///
    /// A failed render leaves both the in-memory entries and the store
    /// untouched. When the store write fails the new artifact is not kept
    /// either, so memory never runs ahead of what was persisted.
    pub async fn get_or_render<F>(
        &self,
        request: &RenderRequest,
        render: F,
    ) -> MapResult<CachedRender>
    where
        F: FnOnce(&RenderRequest) -> MapResult<RenderArtifact>,
    {
        let hash = content_hash(request)?;

        if let Some(artifact) = self.lookup(&hash).await {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            info!(hash = %hash, "Result from cache");
            return Ok(CachedRender {
                hash,
                artifact,
                outcome: CacheOutcome::Hit,
            });
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(hash.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let rendered_here = AtomicBool::new(false);
        let result = {
            let rendered_here = &rendered_here;
            let hash = hash.as_str();
            cell.get_or_try_init(|| async move {
                // Another caller may have stored it between our lookup and
                // taking the cell.
                if let Some(artifact) = self.lookup(hash).await {
                    return Ok(artifact);
                }
                rendered_here.store(true, Ordering::Relaxed);
                self.render_and_store(hash, request, render).await
            })
            .await
            .cloned()
        };

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(&hash)
                .map_or(false, |current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(&hash);
            }
        }

        let artifact = result?;
        let outcome = if rendered_here.load(Ordering::Relaxed) {
            info!(hash = %hash, bytes = artifact.len(), "New result");
            CacheOutcome::Rendered
        } else {
            debug!(hash = %hash, "Joined a concurrent render");
            CacheOutcome::Hit
        };

        Ok(CachedRender {
            hash,
            artifact,
            outcome,
        })
    }

    async fn render_and_store<F>(
        &self,
        hash: &str,
        request: &RenderRequest,
        render: F,
    ) -> MapResult<RenderArtifact>
    where
        F: FnOnce(&RenderRequest) -> MapResult<RenderArtifact>,
    {
        self.stats.renders.fetch_add(1, Ordering::Relaxed);
        let artifact = match render(request) {
            Ok(artifact) => artifact,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let _guard = self.persist_lock.lock().await;
        let mut next = self.entries.read().await.clone();
        next.insert(hash.to_string(), artifact.clone());
        self.store.save(&next).await?;
        self.stats.persists.fetch_add(1, Ordering::Relaxed);

        *self.entries.write().await = next;
        Ok(artifact)
    }

    /// Write every entry to the store.
    pub async fn save(&self) -> MapResult<()> {
        let _guard = self.persist_lock.lock().await;
        let entries = self.entries.read().await.clone();
        self.store.save(&entries).await?;
        self.stats.persists.fetch_add(1, Ordering::Relaxed);
        debug!(entries = entries.len(), "Render cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use traffic_common::{Graph, ImageParams, MapError};

    fn request(width: u32) -> RenderRequest {
        RenderRequest {
            image: ImageParams::new(width, 10, "png"),
            graph: Graph::default(),
            loads: vec![],
        }
    }

    fn fake_render(req: &RenderRequest) -> MapResult<RenderArtifact> {
        Ok(RenderArtifact::from_image_bytes(
            req.image.width.to_string().as_bytes(),
        ))
    }

    #[tokio::test]
    async fn test_second_call_is_a_hit() {
        let cache = RenderCache::open(Arc::new(MemoryStore::new())).await.unwrap();

        let first = cache.get_or_render(&request(10), fake_render).await.unwrap();
        let second = cache.get_or_render(&request(10), fake_render).await.unwrap();

        assert_eq!(first.outcome, CacheOutcome::Rendered);
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(first.artifact, second.artifact);
        assert_eq!(first.hash, second.hash);

        let stats = cache.stats();
        assert_eq!(stats.renders(), 1);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_render_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let cache = RenderCache::open(store.clone()).await.unwrap();

        let err = cache
            .get_or_render(&request(10), |_| Err(MapError::EmptyGraph))
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::EmptyGraph));
        assert!(cache.is_empty().await);
        assert_eq!(store.save_count(), 0);
        assert_eq!(cache.stats().failures(), 1);
    }

    #[tokio::test]
    async fn test_lookup_by_hash() {
        let cache = RenderCache::open(Arc::new(MemoryStore::new())).await.unwrap();
        let req = request(42);
        let hash = content_hash(&req).unwrap();
        assert!(cache.lookup(&hash).await.is_none());

        cache.get_or_render(&req, fake_render).await.unwrap();
        assert_eq!(
            cache.lookup(&hash).await.unwrap().image_bytes().unwrap(),
            b"42"
        );
    }
}
