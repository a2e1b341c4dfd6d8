//! Rasterization of traffic network graphs.
//!
//! - `bounds`: extent of the node set and the canvas transform
//! - `classify`: link load → color table
//! - `raster`: validation and drawing with tiny-skia
//! - `encode` / `png`: PNG, JPEG and BMP output
//! - `pipeline`: the end-to-end [`GraphRenderer`]

pub mod bounds;
pub mod classify;
pub mod encode;
pub mod pipeline;
pub mod png;
pub mod raster;
pub mod style;

pub use bounds::{compute_bounds, compute_scale, scale_point, Bounds, ScaleParams};
pub use classify::{classify, LoadColorTable, LoadThreshold};
pub use encode::OutputFormat;
pub use pipeline::{EncodedImage, GraphRenderer};
pub use raster::{rasterize, RenderedImage};
pub use style::RenderStyle;
