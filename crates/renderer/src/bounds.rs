//! Bounds of the node set and the transform that fits it onto the canvas.
//!
//! The transform is uniform (one scale factor for both axes) so the graph
//! keeps its aspect ratio:
//!
//! ```text
//! px = (x + shift_x) * scale + indent
//! py = (y + shift_y) * scale + indent
//! ```

use traffic_common::{Axis, ImageParams, MapError, MapResult, Node, Point};

/// Axis-aligned extent of the node centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Width of the extent in source units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the extent in source units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Parameters of the source → canvas transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub scale: f64,
    pub shift_x: f64,
    pub shift_y: f64,
    pub indent: f64,
}

impl ScaleParams {
    /// Map a source point onto the canvas.
    #[inline]
    pub fn apply(&self, point: Point) -> Point {
        scale_point(point, self)
    }
}

/// Min/max of node center x and y, taken independently.
///
/// Only the centers count; radii are not part of the extent.
pub fn compute_bounds(nodes: &[Node]) -> MapResult<Bounds> {
    let mut centers = nodes.iter().map(|node| node.circle().map(|c| c.center));

    let first = match centers.next() {
        Some(center) => center?,
        None => return Err(MapError::EmptyGraph),
    };

    let mut bounds = Bounds::new(first.x, first.x, first.y, first.y);
    for center in centers {
        let c = center?;
        bounds.min_x = bounds.min_x.min(c.x);
        bounds.max_x = bounds.max_x.max(c.x);
        bounds.min_y = bounds.min_y.min(c.y);
        bounds.max_y = bounds.max_y.max(c.y);
    }

    Ok(bounds)
}

/// Fit `bounds` into the canvas, leaving `margin_fraction` of the canvas as
/// an empty border on every side.
pub fn compute_scale(
    bounds: &Bounds,
    image: &ImageParams,
    margin_fraction: f64,
) -> MapResult<ScaleParams> {
    image.validate()?;

    if !(0.0..0.5).contains(&margin_fraction) {
        return Err(MapError::ConfigError(format!(
            "margin fraction must be in [0, 0.5), got {}",
            margin_fraction
        )));
    }

    let width = image.width as f64;
    let height = image.height as f64;

    // A zero or subnormal extent has no finite scale.
    let scale_x = width / bounds.width();
    if !scale_x.is_finite() {
        return Err(MapError::DegenerateBounds {
            axis: Axis::X,
            value: bounds.min_x,
        });
    }
    let scale_y = height / bounds.height();
    if !scale_y.is_finite() {
        return Err(MapError::DegenerateBounds {
            axis: Axis::Y,
            value: bounds.min_y,
        });
    }

    let scale = scale_x.min(scale_y) * (1.0 - 2.0 * margin_fraction);
    let indent = width.min(height) * margin_fraction;

    Ok(ScaleParams {
        scale,
        shift_x: -bounds.min_x,
        shift_y: -bounds.min_y,
        indent,
    })
}

/// Apply the transform to a single point.
#[inline]
pub fn scale_point(point: Point, params: &ScaleParams) -> Point {
    Point::new(
        (point.x + params.shift_x) * params.scale + params.indent,
        (point.y + params.shift_y) * params.scale + params.indent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_point_approx_eq};

    fn node(id: i64, x: f64, y: f64) -> Node {
        Node::new(id, Point::new(x, y), 1.0)
    }

    #[test]
    fn test_bounds_of_centers() {
        let nodes = [node(1, -3.0, 4.0), node(2, 5.0, -1.0), node(3, 0.0, 10.0)];
        let bounds = compute_bounds(&nodes).unwrap();
        assert_eq!(bounds, Bounds::new(-3.0, 5.0, -1.0, 10.0));
        assert_eq!(bounds.width(), 8.0);
        assert_eq!(bounds.height(), 11.0);
    }

    #[test]
    fn test_empty_graph() {
        assert!(matches!(compute_bounds(&[]), Err(MapError::EmptyGraph)));
    }

    #[test]
    fn test_square_canvas_scale() {
        let bounds = Bounds::new(0.0, 10.0, 0.0, 10.0);
        let params = compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1).unwrap();
        assert_approx_eq!(params.scale, 8.0, 1e-12);
        assert_approx_eq!(params.indent, 10.0, 1e-12);
        assert_eq!(params.shift_x, 0.0);
        assert_eq!(params.shift_y, 0.0);

        let far = scale_point(Point::new(10.0, 10.0), &params);
        assert_point_approx_eq!((far.x, far.y), (90.0, 90.0), 1e-9);
    }

    #[test]
    fn test_scale_uses_tighter_axis() {
        // Wide extent on a square canvas: x limits the scale.
        let bounds = Bounds::new(0.0, 20.0, 0.0, 5.0);
        let params = compute_scale(&bounds, &ImageParams::new(200, 200, "png"), 0.0).unwrap();
        assert_approx_eq!(params.scale, 10.0, 1e-12);
    }

    #[test]
    fn test_shift_moves_min_corner_to_indent() {
        let bounds = Bounds::new(-5.0, 5.0, 100.0, 110.0);
        let params = compute_scale(&bounds, &ImageParams::new(50, 80, "png"), 0.1).unwrap();
        let origin = params.apply(Point::new(-5.0, 100.0));
        assert_point_approx_eq!((origin.x, origin.y), (5.0, 5.0), 1e-9);
    }

    #[test]
    fn test_degenerate_x() {
        let bounds = compute_bounds(&[node(1, 3.0, 0.0), node(2, 3.0, 10.0)]).unwrap();
        match compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1) {
            Err(MapError::DegenerateBounds { axis, value }) => {
                assert_eq!(axis, Axis::X);
                assert_eq!(value, 3.0);
            }
            other => panic!("expected DegenerateBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_y() {
        let bounds = compute_bounds(&[node(1, 0.0, 7.0), node(2, 4.0, 7.0)]).unwrap();
        assert!(matches!(
            compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1),
            Err(MapError::DegenerateBounds { axis: Axis::Y, .. })
        ));
    }

    #[test]
    fn test_single_node_is_degenerate() {
        let bounds = compute_bounds(&[node(1, 0.0, 0.0)]).unwrap();
        assert!(matches!(
            compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1),
            Err(MapError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn test_subnormal_extent_is_degenerate() {
        let bounds = Bounds::new(0.0, 1e-310, 0.0, 1.0);
        match compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1) {
            Err(MapError::DegenerateBounds { axis, value }) => {
                assert_eq!(axis, Axis::X);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected DegenerateBounds, got {:?}", other),
        }

        let bounds = Bounds::new(0.0, 1.0, 0.0, 5e-324);
        assert!(matches!(
            compute_scale(&bounds, &ImageParams::new(100, 100, "png"), 0.1),
            Err(MapError::DegenerateBounds { axis: Axis::Y, .. })
        ));
    }

    #[test]
    fn test_bad_margin() {
        let bounds = Bounds::new(0.0, 1.0, 0.0, 1.0);
        let image = ImageParams::new(10, 10, "png");
        assert!(matches!(
            compute_scale(&bounds, &image, 0.5),
            Err(MapError::ConfigError(_))
        ));
        assert!(matches!(
            compute_scale(&bounds, &image, -0.1),
            Err(MapError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_sized_canvas() {
        let bounds = Bounds::new(0.0, 1.0, 0.0, 1.0);
        assert!(matches!(
            compute_scale(&bounds, &ImageParams::new(0, 10, "png"), 0.1),
            Err(MapError::InvalidImageParams(_))
        ));
    }
}
