//! A single render run: request file in, result file out.

use std::path::Path;
use tracing::{debug, info};

use renderer::GraphRenderer;
use storage::{CacheOutcome, RenderCache};
use traffic_common::{MapError, MapResult, RenderArtifact, RenderRequest};

use crate::config::RunConfig;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub hash: String,
    pub outcome: CacheOutcome,
    pub image_bytes: usize,
}

/// Execute one run.
///
/// Inputs are all loaded and checked before the cache is touched. When the
/// render fails, neither the result file nor the cache file is written.
pub async fn run(config: &RunConfig) -> MapResult<RunSummary> {
    config.validate()?;
    let renderer = GraphRenderer::new(config.style.clone(), config.load_colors()?)?;

    let request = RenderRequest::from_file(&config.input)?;
    debug!(
        input = %config.input.display(),
        nodes = request.graph.nodes.len(),
        links = request.graph.links.len(),
        loads = request.loads.len(),
        "Request loaded"
    );

    let cache = RenderCache::open_file(&config.cache).await?;
    let result = cache
        .get_or_render(&request, |r| renderer.render(r))
        .await?;

    write_result(&config.output, &result.artifact).await?;

    let image = result.artifact.image_bytes()?;
    if let Some(path) = &config.image_out {
        tokio::fs::write(path, &image).await.map_err(|e| {
            MapError::StorageError(format!("failed to write {}: {}", path.display(), e))
        })?;
    }

    info!(
        hash = %result.hash,
        outcome = ?result.outcome,
        bytes = image.len(),
        output = %config.output.display(),
        "Run complete"
    );

    Ok(RunSummary {
        hash: result.hash,
        outcome: result.outcome,
        image_bytes: image.len(),
    })
}

async fn write_result(path: &Path, artifact: &RenderArtifact) -> MapResult<()> {
    let data = serde_json::to_vec(artifact)?;
    tokio::fs::write(path, data).await.map_err(|e| {
        MapError::StorageError(format!("failed to write {}: {}", path.display(), e))
    })
}
