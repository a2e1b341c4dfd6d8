//! Error types for the traffic map renderer.

use thiserror::Error;

use crate::graph::ElementId;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Axis of the node extent that collapsed to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Primary error type for render operations.
#[derive(Debug, Error)]
pub enum MapError {
    // === Input Errors ===
    #[error("Graph has no nodes, bounds are undefined")]
    EmptyGraph,

    #[error("Degenerate bounds: all node centers share the same {axis} coordinate ({value})")]
    DegenerateBounds { axis: Axis, value: f64 },

    #[error("Link {link_id} has {points} point(s), a polyline needs at least 2")]
    InvalidPolyline { link_id: ElementId, points: usize },

    #[error("Unsupported geometry '{kind}' for {element} {id}")]
    UnsupportedGeometry {
        element: &'static str,
        id: ElementId,
        kind: String,
    },

    #[error("Invalid geometry for {element} {id}: {message}")]
    InvalidGeometry {
        element: &'static str,
        id: ElementId,
        message: String,
    },

    #[error("Load {load} of link {link_id} exceeds the highest color threshold {ceiling}")]
    LoadOutOfRange {
        link_id: ElementId,
        load: f64,
        ceiling: f64,
    },

    #[error("Invalid image parameters: {0}")]
    InvalidImageParams(String),

    #[error("Requested format not supported: {0}")]
    UnsupportedFormat(String),

    // === Infrastructure Errors ===
    #[error("Image encoding failed: {0}")]
    EncodingError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MapError {
    /// Whether the error was caused by the request payload rather than by the
    /// environment. Input errors are never retried with the same payload.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MapError::EmptyGraph
                | MapError::DegenerateBounds { .. }
                | MapError::InvalidPolyline { .. }
                | MapError::UnsupportedGeometry { .. }
                | MapError::InvalidGeometry { .. }
                | MapError::LoadOutOfRange { .. }
                | MapError::InvalidImageParams(_)
                | MapError::UnsupportedFormat(_)
        )
    }

    /// Process exit code for the CLI: 2 for bad input, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            2
        } else {
            1
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::SerializationError(format!("JSON error: {}", err))
    }
}
