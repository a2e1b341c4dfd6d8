//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use renderer::{LoadColorTable, RenderStyle};
use traffic_common::MapResult;

/// Everything one render run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Render request payload
    pub input: PathBuf,

    /// Persisted render cache
    pub cache: PathBuf,

    /// Where `{"image": "<base64>"}` is written
    pub output: PathBuf,

    /// Load color table; the built-in table when unset
    pub colors: Option<PathBuf>,

    /// Optional raw copy of the encoded image
    pub image_out: Option<PathBuf>,

    /// Visual style
    pub style: RenderStyle,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data.json"),
            cache: PathBuf::from("cache.json"),
            output: PathBuf::from("result.json"),
            colors: None,
            image_out: None,
            style: RenderStyle::default(),
        }
    }
}

impl RunConfig {
    /// Default paths with the style taken from the environment.
    pub fn from_env() -> Self {
        Self {
            style: RenderStyle::from_env(),
            ..Self::default()
        }
    }

    /// Resolve the color table.
    pub fn load_colors(&self) -> MapResult<LoadColorTable> {
        match &self.colors {
            Some(path) => LoadColorTable::from_file(path),
            None => Ok(LoadColorTable::default()),
        }
    }

    pub fn validate(&self) -> MapResult<()> {
        self.style.validate()
    }
}
