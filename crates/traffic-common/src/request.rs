//! Render request payload and the rendered artifact.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MapError, MapResult};
use crate::graph::{Graph, LoadEntry};

/// Output canvas size and encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl ImageParams {
    pub fn new(width: u32, height: u32, format: impl Into<String>) -> Self {
        Self {
            width,
            height,
            format: format.into(),
        }
    }

    /// Both dimensions must be non-zero, the scale computation divides by them.
    pub fn validate(&self) -> MapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::InvalidImageParams(format!(
                "width and height must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Everything needed to draw one image. This is the unit that gets hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub image: ImageParams,
    pub graph: Graph,
    #[serde(default)]
    pub loads: Vec<LoadEntry>,
}

impl RenderRequest {
    /// Parse a request from its JSON payload.
    pub fn from_json(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a request payload from a file.
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapError::StorageError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

/// Encoded image produced for one request, stored as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderArtifact {
    pub image: String,
}

impl RenderArtifact {
    pub fn from_image_bytes(bytes: &[u8]) -> Self {
        Self {
            image: general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Decode the base64 payload back into encoded image bytes.
    pub fn image_bytes(&self) -> MapResult<Vec<u8>> {
        general_purpose::STANDARD
            .decode(self.image.as_bytes())
            .map_err(|e| MapError::SerializationError(format!("invalid base64 image: {}", e)))
    }

    /// Size of the base64 payload in bytes.
    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}
