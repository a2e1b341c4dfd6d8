//! Render cache storage.
//!
//! - [`RenderCache`]: content-addressed, single-flight cache of artifacts
//! - [`CacheStore`]: persistence seam with JSON file and in-memory backends

pub mod render_cache;
pub mod store;

pub use render_cache::{CacheOutcome, CachedRender, RenderCache, RenderCacheStats};
pub use store::{CacheEntries, CacheStore, JsonFileStore, MemoryStore};
