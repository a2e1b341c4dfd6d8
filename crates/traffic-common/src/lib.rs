//! Common types shared by the traffic map renderer crates.

pub mod color;
pub mod error;
pub mod graph;
pub mod hash;
pub mod request;

pub use color::{Color, ColorError};
pub use error::{Axis, MapError, MapResult};
pub use graph::{Circle, ElementId, Geometry, Graph, Link, LoadEntry, LoadTable, Node, Point};
pub use hash::{canonical_json, content_hash};
pub use request::{ImageParams, RenderArtifact, RenderRequest};
