//! Integration tests for the render cache over real payloads and stores.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storage::{CacheEntries, CacheOutcome, CacheStore, JsonFileStore, MemoryStore, RenderCache};
use test_utils::{fixtures, road_network, RunPaths, SINGLE_POINT_LINK};
use traffic_common::{content_hash, MapError, MapResult, RenderArtifact, RenderRequest};

/// Stand-in renderer that counts invocations.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
}

impl CountingRenderer {
    fn render(&self, request: &RenderRequest) -> MapResult<RenderArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.graph.links.iter().any(|l| l.polyline().is_err()) {
            return Err(MapError::InvalidPolyline {
                link_id: request.graph.links[0].id.clone(),
                points: 1,
            });
        }
        let body = format!(
            "{}x{}:{}",
            request.image.width,
            request.image.height,
            request.graph.links.len()
        );
        Ok(RenderArtifact::from_image_bytes(body.as_bytes()))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Memory store whose writes yield to the scheduler several times, so a
/// render stays in flight while other callers arrive.
#[derive(Default)]
struct SlowStore {
    inner: MemoryStore,
}

#[async_trait]
impl CacheStore for SlowStore {
    async fn load(&self) -> MapResult<CacheEntries> {
        self.inner.load().await
    }

    async fn save(&self, entries: &CacheEntries) -> MapResult<()> {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        self.inner.save(entries).await
    }

    fn describe(&self) -> String {
        "slow-memory".to_string()
    }
}

#[tokio::test]
async fn test_identical_requests_render_once() {
    let renderer = CountingRenderer::default();
    let cache = RenderCache::open(Arc::new(MemoryStore::new())).await.unwrap();
    let request = road_network();

    let first = cache
        .get_or_render(&request, |r| renderer.render(r))
        .await
        .unwrap();
    for _ in 0..3 {
        let again = cache
            .get_or_render(&request, |r| renderer.render(r))
            .await
            .unwrap();
        assert_eq!(again.outcome, CacheOutcome::Hit);
        assert_eq!(again.artifact, first.artifact);
    }

    assert_eq!(first.outcome, CacheOutcome::Rendered);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(cache.stats().hits(), 3);
}

#[tokio::test]
async fn test_reformatted_payload_hits_the_same_entry() {
    let renderer = CountingRenderer::default();
    let cache = RenderCache::open(Arc::new(MemoryStore::new())).await.unwrap();

    let compact: serde_json::Value = serde_json::from_str(fixtures::ROAD_NETWORK).unwrap();
    let compact = RenderRequest::from_json(&compact.to_string()).unwrap();

    let a = cache
        .get_or_render(&road_network(), |r| renderer.render(r))
        .await
        .unwrap();
    let b = cache
        .get_or_render(&compact, |r| renderer.render(r))
        .await
        .unwrap();

    assert_eq!(a.hash, b.hash);
    assert_eq!(b.outcome, CacheOutcome::Hit);
    assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_render() {
    let renderer = CountingRenderer::default();
    let cache = RenderCache::open(Arc::new(SlowStore::default())).await.unwrap();
    let request = road_network();

    let (a, b, c) = tokio::join!(
        cache.get_or_render(&request, |r| renderer.render(r)),
        cache.get_or_render(&request, |r| renderer.render(r)),
        cache.get_or_render(&request, |r| renderer.render(r)),
    );
    let results = [a.unwrap(), b.unwrap(), c.unwrap()];

    assert_eq!(renderer.calls(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| r.outcome == CacheOutcome::Rendered)
            .count(),
        1
    );
    assert!(results.iter().all(|r| r.artifact == results[0].artifact));
    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.stats().persists(), 1);
}

#[tokio::test]
async fn test_different_requests_render_separately() {
    let renderer = CountingRenderer::default();
    let cache = RenderCache::open(Arc::new(SlowStore::default())).await.unwrap();
    let first = road_network();
    let mut second = road_network();
    second.image.width = 321;

    let (a, b) = tokio::join!(
        cache.get_or_render(&first, |r| renderer.render(r)),
        cache.get_or_render(&second, |r| renderer.render(r)),
    );

    assert_ne!(a.unwrap().hash, b.unwrap().hash);
    assert_eq!(renderer.calls(), 2);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_failed_render_leaves_file_untouched() {
    let paths = RunPaths::new();
    let renderer = CountingRenderer::default();

    let cache = RenderCache::open_file(&paths.cache).await.unwrap();
    cache
        .get_or_render(&road_network(), |r| renderer.render(r))
        .await
        .unwrap();
    let before = std::fs::read(&paths.cache).unwrap();

    let err = cache
        .get_or_render(&fixtures::request(SINGLE_POINT_LINK), |r| renderer.render(r))
        .await
        .unwrap_err();
    assert!(err.is_input_error());

    assert_eq!(std::fs::read(&paths.cache).unwrap(), before);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_entries_survive_restart() {
    let paths = RunPaths::new();
    let request = road_network();
    let hash = content_hash(&request).unwrap();

    {
        let renderer = CountingRenderer::default();
        let cache = RenderCache::open_file(&paths.cache).await.unwrap();
        assert!(cache.is_empty().await);
        cache
            .get_or_render(&request, |r| renderer.render(r))
            .await
            .unwrap();
    }

    let renderer = CountingRenderer::default();
    let cache = RenderCache::open_file(&paths.cache).await.unwrap();
    assert!(cache.lookup(&hash).await.is_some());

    let again = cache
        .get_or_render(&request, |r| renderer.render(r))
        .await
        .unwrap();
    assert_eq!(again.outcome, CacheOutcome::Hit);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_cache_file_is_hash_to_image_object() {
    let paths = RunPaths::new();
    let request = road_network();
    let renderer = CountingRenderer::default();

    let cache = RenderCache::open_file(&paths.cache).await.unwrap();
    let result = cache
        .get_or_render(&request, |r| renderer.render(r))
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&paths.cache).unwrap()).unwrap();
    let object = raw.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(
        object[&result.hash]["image"].as_str().unwrap(),
        result.artifact.image
    );
}

#[tokio::test]
async fn test_explicit_save_writes_loaded_entries() {
    let mut seeded = CacheEntries::new();
    seeded.insert("00".repeat(32), RenderArtifact::from_image_bytes(b"old"));

    let store = Arc::new(MemoryStore::with_entries(seeded.clone()));
    let cache = RenderCache::open(store.clone()).await.unwrap();
    assert_eq!(cache.len().await, 1);

    cache.save().await.unwrap();
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.snapshot().await, seeded);
}

#[tokio::test]
async fn test_saving_an_empty_cache_creates_the_file() {
    let paths = RunPaths::new();
    let store = JsonFileStore::new(&paths.cache);
    let cache = RenderCache::open(Arc::new(store.clone())).await.unwrap();

    cache.save().await.unwrap();
    assert!(paths.cache.exists());
    assert!(store.load().await.unwrap().is_empty());
}
