//! Synthetic graphs of arbitrary size for tests and benchmarks.

use traffic_common::{Graph, ImageParams, Link, LoadEntry, Node, Point, RenderRequest};

/// Creates a `cols` x `rows` lattice of junctions `spacing` apart.
///
/// Node ids are `row * cols + col`. Every junction is linked to its right
/// and lower neighbour; link ids continue after the last node id.
///
/// # Example
///
/// ```
/// use test_utils::create_grid_graph;
///
/// let graph = create_grid_graph(3, 2, 1.0);
/// assert_eq!(graph.nodes.len(), 6);
/// assert_eq!(graph.links.len(), 7); // 2*2 horizontal + 3*1 vertical
/// ```
pub fn create_grid_graph(cols: usize, rows: usize, spacing: f64) -> Graph {
    let mut nodes = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            nodes.push(Node::new(
                (row * cols + col) as i64,
                Point::new(col as f64 * spacing, row as f64 * spacing),
                spacing * 0.1,
            ));
        }
    }

    let mut links = Vec::new();
    let mut next_id = (cols * rows) as i64;
    for row in 0..rows {
        for col in 0..cols {
            let here = Point::new(col as f64 * spacing, row as f64 * spacing);
            if col + 1 < cols {
                let right = Point::new(here.x + spacing, here.y);
                links.push(Link::new(next_id, vec![here, right]));
                next_id += 1;
            }
            if row + 1 < rows {
                let below = Point::new(here.x, here.y + spacing);
                links.push(Link::new(next_id, vec![here, below]));
                next_id += 1;
            }
        }
    }

    Graph { nodes, links }
}

/// Deterministic loads in `[0, ceiling]` for every other link of `graph`.
///
/// Links at odd positions get no entry, so they render in the unknown color.
pub fn create_cycling_loads(graph: &Graph, ceiling: f64) -> Vec<LoadEntry> {
    graph
        .links
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(i, link)| LoadEntry {
            link_id: link.id.clone(),
            load: ((i * 7) % 11) as f64 / 10.0 * ceiling,
        })
        .collect()
}

/// A full request over a lattice graph with cycling loads.
pub fn create_grid_request(
    cols: usize,
    rows: usize,
    width: u32,
    height: u32,
    format: &str,
) -> RenderRequest {
    let graph = create_grid_graph(cols, rows, 1.0);
    let loads = create_cycling_loads(&graph, 10.0);
    RenderRequest {
        image: ImageParams::new(width, height, format),
        graph,
        loads,
    }
}
