//! Rasterization of a graph onto an RGBA canvas.
//!
//! Rendering happens in two passes. [`build_scene`] validates the whole
//! request and maps every shape into canvas space; only when that succeeds
//! does [`draw_scene`] touch pixels. A bad element anywhere in the request
//! therefore never yields a partially drawn image.

use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};
use tracing::debug;

use traffic_common::{Color, ElementId, LoadTable, MapError, MapResult, Point, RenderRequest};

use crate::bounds::{compute_bounds, compute_scale, ScaleParams};
use crate::classify::{classify, LoadColorTable};
use crate::style::RenderStyle;

/// Straight (non-premultiplied) RGBA pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RenderedImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Number of pixels with exactly this color.
    pub fn count_color(&self, color: Color) -> usize {
        let target = [color.r, color.g, color.b, color.a];
        self.pixels
            .chunks_exact(4)
            .filter(|p| *p == target)
            .count()
    }
}

/// A node circle in canvas space, given by its scaled bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: ElementId,
    pub top_left: Point,
    pub bottom_right: Point,
}

/// A link polyline in canvas space with its load color.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkShape {
    pub id: ElementId,
    pub points: Vec<Point>,
    pub color: Color,
}

/// A fully validated request, ready to draw.
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub transform: ScaleParams,
    pub nodes: Vec<NodeShape>,
    pub links: Vec<LinkShape>,
}

/// Validate a request and place every shape on the canvas.
pub fn build_scene(
    request: &RenderRequest,
    style: &RenderStyle,
    colors: &LoadColorTable,
) -> MapResult<Scene> {
    request.image.validate()?;

    let bounds = compute_bounds(&request.graph.nodes)?;
    let transform = compute_scale(&bounds, &request.image, style.margin_fraction)?;

    let nodes = request
        .graph
        .nodes
        .iter()
        .map(|node| {
            let (low, high) = node.circle()?.corners();
            Ok(NodeShape {
                id: node.id.clone(),
                top_left: transform.apply(low),
                bottom_right: transform.apply(high),
            })
        })
        .collect::<MapResult<Vec<_>>>()?;

    let loads = LoadTable::from_entries(&request.loads);
    let links = request
        .graph
        .links
        .iter()
        .map(|link| {
            let points = link
                .polyline()?
                .iter()
                .map(|p| transform.apply(*p))
                .collect();
            Ok(LinkShape {
                id: link.id.clone(),
                points,
                color: classify(&link.id, &loads, colors)?,
            })
        })
        .collect::<MapResult<Vec<_>>>()?;

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        loads = loads.len(),
        scale = transform.scale,
        indent = transform.indent,
        "Scene built"
    );

    Ok(Scene {
        width: request.image.width,
        height: request.image.height,
        transform,
        nodes,
        links,
    })
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    paint
}

/// Draw a validated scene: background, then nodes, then links on top.
pub fn draw_scene(scene: &Scene, style: &RenderStyle) -> MapResult<RenderedImage> {
    let mut pixmap = Pixmap::new(scene.width, scene.height).ok_or_else(|| {
        MapError::InvalidImageParams(format!(
            "cannot allocate a {}x{} canvas",
            scene.width, scene.height
        ))
    })?;

    let bg = style.background;
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

    let node_paint = solid_paint(style.node_color);
    for node in &scene.nodes {
        draw_node(&mut pixmap, node, &node_paint);
    }

    let mut stroke = Stroke::default();
    stroke.width = style.link_width;
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    for link in &scene.links {
        let mut pb = PathBuilder::new();
        let mut points = link.points.iter();
        if let Some(first) = points.next() {
            pb.move_to(first.x as f32, first.y as f32);
        }
        for p in points {
            pb.line_to(p.x as f32, p.y as f32);
        }

        match pb.finish() {
            Some(path) => {
                pixmap.stroke_path(
                    &path,
                    &solid_paint(link.color),
                    &stroke,
                    Transform::identity(),
                    None,
                );
            }
            None => debug!(link_id = %link.id, "Skipping degenerate link path"),
        }
    }

    let pixels = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    Ok(RenderedImage {
        width: scene.width,
        height: scene.height,
        pixels,
    })
}

fn draw_node(pixmap: &mut Pixmap, node: &NodeShape, paint: &Paint) {
    let oval = Rect::from_ltrb(
        node.top_left.x as f32,
        node.top_left.y as f32,
        node.bottom_right.x as f32,
        node.bottom_right.y as f32,
    )
    .filter(|r| r.width() >= 1.0 && r.height() >= 1.0)
    .and_then(PathBuilder::from_oval);

    match oval {
        Some(path) => {
            pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
        None => {
            // Sub-pixel circle: mark the single pixel under the center.
            let cx = (node.top_left.x + node.bottom_right.x) / 2.0;
            let cy = (node.top_left.y + node.bottom_right.y) / 2.0;
            if let Some(dot) = Rect::from_xywh(cx.floor() as f32, cy.floor() as f32, 1.0, 1.0) {
                pixmap.fill_rect(dot, paint, Transform::identity(), None);
            }
        }
    }
}

/// Validate and draw a request in one call.
pub fn rasterize(
    request: &RenderRequest,
    style: &RenderStyle,
    colors: &LoadColorTable,
) -> MapResult<RenderedImage> {
    let scene = build_scene(request, style, colors)?;
    draw_scene(&scene, style)
}
