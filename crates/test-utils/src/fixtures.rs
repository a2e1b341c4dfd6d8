//! Sample render request payloads.
//!
//! Payloads are kept as JSON text so tests exercise the same parsing path as
//! the CLI.

use traffic_common::RenderRequest;

/// A small road network: four junctions in a square, five roads, one of them
/// without load data.
///
/// On a 200x200 canvas with a 0.1 margin the scale is 16 and the indent 20,
/// so junction `(x, y)` lands at `(16x + 20, 16y + 20)`.
pub const ROAD_NETWORK: &str = r#"{
    "image": {"width": 200, "height": 200, "format": "png"},
    "graph": {
        "nodes": [
            {"id": 1, "geometry": {"type": "Circle", "center": [0, 0], "radius": 0.25}},
            {"id": 2, "geometry": {"type": "Circle", "center": [10, 0], "radius": 0.25}},
            {"id": 3, "geometry": {"type": "Circle", "center": [10, 10], "radius": 0.25}},
            {"id": 4, "geometry": {"type": "Circle", "center": [0, 10], "radius": 0.25}}
        ],
        "links": [
            {"id": 12, "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 0]]}},
            {"id": 23, "geometry": {"type": "LineString", "coordinates": [[10, 0], [10, 10]]}},
            {"id": 34, "geometry": {"type": "LineString", "coordinates": [[10, 10], [0, 10]]}},
            {"id": 41, "geometry": {"type": "LineString", "coordinates": [[0, 10], [0, 0]]}},
            {"id": 13, "geometry": {"type": "LineString", "coordinates": [[0, 0], [5, 3], [10, 10]]}}
        ]
    },
    "loads": [
        {"link_id": 12, "load": 1.5},
        {"link_id": 23, "load": 4},
        {"link_id": 34, "load": 8.5},
        {"link_id": 41, "load": 10}
    ]
}"#;

/// A link with a single vertex.
pub const SINGLE_POINT_LINK: &str = r#"{
    "image": {"width": 100, "height": 100, "format": "png"},
    "graph": {
        "nodes": [
            {"id": 1, "geometry": {"type": "Circle", "center": [0, 0], "radius": 1}},
            {"id": 2, "geometry": {"type": "Circle", "center": [5, 5], "radius": 1}}
        ],
        "links": [
            {"id": 9, "geometry": {"type": "LineString", "coordinates": [[0, 0]]}}
        ]
    },
    "loads": []
}"#;

/// All junctions on one vertical line.
pub const VERTICAL_LINE: &str = r#"{
    "image": {"width": 100, "height": 100, "format": "png"},
    "graph": {
        "nodes": [
            {"id": 1, "geometry": {"type": "Circle", "center": [3, 0], "radius": 1}},
            {"id": 2, "geometry": {"type": "Circle", "center": [3, 8], "radius": 1}}
        ],
        "links": []
    }
}"#;

/// A link loaded above the highest default threshold.
pub const OVERLOADED_LINK: &str = r#"{
    "image": {"width": 100, "height": 100, "format": "jpeg"},
    "graph": {
        "nodes": [
            {"id": "a", "geometry": {"type": "Circle", "center": [0, 0], "radius": 1}},
            {"id": "b", "geometry": {"type": "Circle", "center": [5, 5], "radius": 1}}
        ],
        "links": [
            {"id": "ab", "geometry": {"type": "LineString", "coordinates": [[0, 0], [5, 5]]}}
        ]
    },
    "loads": [{"link_id": "ab", "load": 11}]
}"#;

/// Parse one of the payloads above.
pub fn request(payload: &str) -> RenderRequest {
    RenderRequest::from_json(payload).expect("fixture payload should parse")
}

/// The road network payload, parsed.
pub fn road_network() -> RenderRequest {
    request(ROAD_NETWORK)
}
