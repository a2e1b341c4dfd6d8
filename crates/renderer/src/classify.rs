//! Load → color classification for links.
//!
//! A [`LoadColorTable`] is a short ascending list of inclusive upper bounds.
//! A link takes the color of the first threshold its load does not exceed.
//! Links without a load entry take the table's `unknown` color, and so do
//! loads at or below the `unknown_max` sentinel (-1 by default).

use serde::{Deserialize, Serialize};
use std::path::Path;

use traffic_common::{Color, ElementId, LoadTable, MapError, MapResult};

/// One class of the color table: loads up to and including `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadThreshold {
    pub max: f64,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LoadThreshold {
    pub fn new(max: f64, color: Color) -> Self {
        Self {
            max,
            color,
            label: None,
        }
    }
}

/// Ordered threshold table plus the color for links with no load data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLoadColorTable")]
pub struct LoadColorTable {
    unknown: Color,
    unknown_max: f64,
    thresholds: Vec<LoadThreshold>,
}

#[derive(Deserialize)]
struct RawLoadColorTable {
    #[serde(default = "default_unknown")]
    unknown: Color,
    #[serde(default = "default_unknown_max")]
    unknown_max: f64,
    thresholds: Vec<LoadThreshold>,
}

fn default_unknown() -> Color {
    Color::GREY
}

fn default_unknown_max() -> f64 {
    -1.0
}

impl TryFrom<RawLoadColorTable> for LoadColorTable {
    type Error = MapError;

    fn try_from(raw: RawLoadColorTable) -> Result<Self, Self::Error> {
        LoadColorTable::build(raw.thresholds, raw.unknown, raw.unknown_max)
    }
}

impl Default for LoadColorTable {
    /// Green up to 2, yellow up to 6, red up to 9, dark red up to 10, grey for
    /// links without data.
    fn default() -> Self {
        Self {
            unknown: Color::GREY,
            unknown_max: default_unknown_max(),
            thresholds: vec![
                LoadThreshold::new(2.0, Color::GREEN),
                LoadThreshold::new(6.0, Color::YELLOW),
                LoadThreshold::new(9.0, Color::RED),
                LoadThreshold::new(10.0, Color::DARK_RED),
            ],
        }
    }
}

impl LoadColorTable {
    /// Build a table. Thresholds are sorted ascending; the table must be
    /// non-empty, finite and free of duplicate thresholds. The unknown
    /// sentinel starts at -1, so every threshold must lie above it.
    pub fn new(thresholds: Vec<LoadThreshold>, unknown: Color) -> MapResult<Self> {
        Self::build(thresholds, unknown, default_unknown_max())
    }

    fn build(
        mut thresholds: Vec<LoadThreshold>,
        unknown: Color,
        unknown_max: f64,
    ) -> MapResult<Self> {
        if thresholds.is_empty() {
            return Err(MapError::ConfigError(
                "load color table needs at least one threshold".to_string(),
            ));
        }
        if let Some(bad) = thresholds.iter().find(|t| !t.max.is_finite()) {
            return Err(MapError::ConfigError(format!(
                "load threshold must be finite, got {}",
                bad.max
            )));
        }

        thresholds.sort_by(|a, b| a.max.total_cmp(&b.max));

        if let Some(pair) = thresholds.windows(2).find(|w| w[0].max == w[1].max) {
            return Err(MapError::ConfigError(format!(
                "duplicate load threshold {}",
                pair[0].max
            )));
        }

        Self {
            unknown,
            unknown_max,
            thresholds,
        }
        .with_unknown_max(unknown_max)
    }

    /// Replace the sentinel at or below which a known load counts as unknown.
    pub fn with_unknown_max(mut self, unknown_max: f64) -> MapResult<Self> {
        if !unknown_max.is_finite() {
            return Err(MapError::ConfigError(format!(
                "unknown load sentinel must be finite, got {}",
                unknown_max
            )));
        }
        if let Some(lowest) = self.thresholds.first().filter(|t| t.max <= unknown_max) {
            return Err(MapError::ConfigError(format!(
                "load threshold {} is not above the unknown sentinel {}",
                lowest.max, unknown_max
            )));
        }
        self.unknown_max = unknown_max;
        Ok(self)
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> MapResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MapError::ConfigError(format!("invalid load color table: {}", e)))
    }

    /// Load a table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn unknown(&self) -> Color {
        self.unknown
    }

    pub fn unknown_max(&self) -> f64 {
        self.unknown_max
    }

    pub fn thresholds(&self) -> &[LoadThreshold] {
        &self.thresholds
    }

    /// The highest threshold; loads above it cannot be classified.
    pub fn ceiling(&self) -> f64 {
        self.thresholds.last().map(|t| t.max).unwrap_or(f64::NEG_INFINITY)
    }

    /// Color for a known load, or `None` when the load is above the ceiling.
    pub fn color_for_load(&self, load: f64) -> Option<Color> {
        if load <= self.unknown_max {
            return Some(self.unknown);
        }
        self.thresholds
            .iter()
            .find(|t| load <= t.max)
            .map(|t| t.color)
    }
}

/// Color for one link.
pub fn classify(link_id: &ElementId, loads: &LoadTable, table: &LoadColorTable) -> MapResult<Color> {
    let Some(load) = loads.get(link_id) else {
        return Ok(table.unknown());
    };

    table
        .color_for_load(load)
        .ok_or_else(|| MapError::LoadOutOfRange {
            link_id: link_id.clone(),
            load,
            ceiling: table.ceiling(),
        })
}
