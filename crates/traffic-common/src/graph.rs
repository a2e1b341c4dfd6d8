//! Graph geometry: nodes drawn as circles, links drawn as polylines, and the
//! per-link load table.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::error::{MapError, MapResult};

/// A point in the payload's planar coordinate system, encoded as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Identifier of a node or link. Payloads use either integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementId::Int(id) => write!(f, "{}", id),
            ElementId::Text(id) => write!(f, "'{}'", id),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId::Int(id)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        ElementId::Text(id.to_string())
    }
}

/// Geometry attached to a graph element.
///
/// `Circle` and `LineString` are decoded into typed variants. Any other
/// `type` is kept verbatim so the request still parses and hashes; the
/// renderer rejects it with [`MapError::UnsupportedGeometry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Circle { center: Point, radius: f64 },
    LineString { coordinates: Vec<Point> },
    Other { kind: String, body: Value },
}

impl Geometry {
    /// The geometry `type` tag as it appears on the wire.
    pub fn kind(&self) -> &str {
        match self {
            Geometry::Circle { .. } => "Circle",
            Geometry::LineString { .. } => "LineString",
            Geometry::Other { kind, .. } => kind,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum KnownGeometry {
    Circle { center: Point, radius: f64 },
    LineString { coordinates: Vec<Point> },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum KnownGeometryRef<'a> {
    Circle { center: &'a Point, radius: f64 },
    LineString { coordinates: &'a [Point] },
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        match kind.as_str() {
            "Circle" | "LineString" => {
                let known = KnownGeometry::deserialize(value).map_err(D::Error::custom)?;
                Ok(match known {
                    KnownGeometry::Circle { center, radius } => Geometry::Circle { center, radius },
                    KnownGeometry::LineString { coordinates } => {
                        Geometry::LineString { coordinates }
                    }
                })
            }
            _ => Ok(Geometry::Other { kind, body: value }),
        }
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Geometry::Circle { center, radius } => KnownGeometryRef::Circle {
                center,
                radius: *radius,
            }
            .serialize(serializer),
            Geometry::LineString { coordinates } => {
                KnownGeometryRef::LineString { coordinates }.serialize(serializer)
            }
            Geometry::Other { body, .. } => body.serialize(serializer),
        }
    }
}

/// A graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: ElementId,
    pub geometry: Geometry,
}

/// A filled circle in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    /// Opposite corners of the circle's bounding box: `center - r`, `center + r`.
    pub fn corners(&self) -> (Point, Point) {
        (
            Point::new(self.center.x - self.radius, self.center.y - self.radius),
            Point::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

impl Node {
    pub fn new(id: impl Into<ElementId>, center: Point, radius: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Geometry::Circle { center, radius },
        }
    }

    /// The node's circle, or the reason it cannot be drawn as one.
    pub fn circle(&self) -> MapResult<Circle> {
        match &self.geometry {
            Geometry::Circle { center, radius } => {
                if !center.is_finite() {
                    return Err(MapError::InvalidGeometry {
                        element: "node",
                        id: self.id.clone(),
                        message: "center is not finite".to_string(),
                    });
                }
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(MapError::InvalidGeometry {
                        element: "node",
                        id: self.id.clone(),
                        message: format!("radius must be a non-negative number, got {}", radius),
                    });
                }
                Ok(Circle {
                    center: *center,
                    radius: *radius,
                })
            }
            other => Err(MapError::UnsupportedGeometry {
                element: "node",
                id: self.id.clone(),
                kind: other.kind().to_string(),
            }),
        }
    }
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: ElementId,
    pub geometry: Geometry,
}

impl Link {
    pub fn new(id: impl Into<ElementId>, coordinates: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            geometry: Geometry::LineString { coordinates },
        }
    }

    /// The link's polyline vertices. Fewer than two points is rejected.
    pub fn polyline(&self) -> MapResult<&[Point]> {
        match &self.geometry {
            Geometry::LineString { coordinates } => {
                if coordinates.len() < 2 {
                    return Err(MapError::InvalidPolyline {
                        link_id: self.id.clone(),
                        points: coordinates.len(),
                    });
                }
                if let Some(bad) = coordinates.iter().find(|p| !p.is_finite()) {
                    return Err(MapError::InvalidGeometry {
                        element: "link",
                        id: self.id.clone(),
                        message: format!("vertex ({}, {}) is not finite", bad.x, bad.y),
                    });
                }
                Ok(coordinates)
            }
            other => Err(MapError::UnsupportedGeometry {
                element: "link",
                id: self.id.clone(),
                kind: other.kind().to_string(),
            }),
        }
    }
}

/// The network to draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Load value reported for one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEntry {
    pub link_id: ElementId,
    pub load: f64,
}

impl LoadEntry {
    pub fn new(link_id: impl Into<ElementId>, load: f64) -> Self {
        Self {
            link_id: link_id.into(),
            load,
        }
    }
}

/// Lookup from link id to load.
#[derive(Debug, Clone, Default)]
pub struct LoadTable {
    loads: HashMap<ElementId, f64>,
}

impl LoadTable {
    /// Build the table from load entries in payload order.
    ///
    /// When a link id appears more than once the last entry wins.
    pub fn from_entries(entries: &[LoadEntry]) -> Self {
        let mut loads = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(previous) = loads.insert(entry.link_id.clone(), entry.load) {
                warn!(
                    link_id = %entry.link_id,
                    previous,
                    load = entry.load,
                    "Duplicate load entry, keeping the last one"
                );
            }
        }
        Self { loads }
    }

    pub fn get(&self, link_id: &ElementId) -> Option<f64> {
        self.loads.get(link_id).copied()
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}
