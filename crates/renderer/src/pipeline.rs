//! End-to-end render: request → canvas → encoded bytes → artifact.

use std::time::Instant;
use tracing::{debug, info};

use traffic_common::{MapResult, RenderArtifact, RenderRequest};

use crate::classify::LoadColorTable;
use crate::encode::{encode, OutputFormat};
use crate::raster::{rasterize, RenderedImage};
use crate::style::RenderStyle;

/// Encoded output of one render.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Renders graph requests with a fixed style and color table.
#[derive(Debug, Clone, Default)]
pub struct GraphRenderer {
    style: RenderStyle,
    colors: LoadColorTable,
}

impl GraphRenderer {
    pub fn new(style: RenderStyle, colors: LoadColorTable) -> MapResult<Self> {
        style.validate()?;
        Ok(Self { style, colors })
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn colors(&self) -> &LoadColorTable {
        &self.colors
    }

    /// Draw the request without encoding it.
    pub fn rasterize(&self, request: &RenderRequest) -> MapResult<RenderedImage> {
        rasterize(request, &self.style, &self.colors)
    }

    /// Draw and encode the request in its requested format.
    pub fn render_encoded(&self, request: &RenderRequest) -> MapResult<EncodedImage> {
        // Reject unknown formats before doing any drawing.
        let format = OutputFormat::parse(&request.image.format)?;

        let start = Instant::now();
        let image = self.rasterize(request)?;
        let raster_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let bytes = encode(&image, format, self.style.jpeg_quality)?;
        let encode_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            width = image.width,
            height = image.height,
            format = %format,
            bytes = bytes.len(),
            raster_ms,
            encode_ms,
            "Rendered graph"
        );

        Ok(EncodedImage {
            format,
            width: image.width,
            height: image.height,
            bytes,
        })
    }

    /// Render the request into a base64 artifact.
    pub fn render(&self, request: &RenderRequest) -> MapResult<RenderArtifact> {
        let encoded = self.render_encoded(request)?;
        info!(
            nodes = request.graph.nodes.len(),
            links = request.graph.links.len(),
            format = %encoded.format,
            bytes = encoded.bytes.len(),
            "Render complete"
        );
        Ok(RenderArtifact::from_image_bytes(&encoded.bytes))
    }
}
