//! Fixed visual style for graph rendering.

use serde::{Deserialize, Serialize};

use traffic_common::{Color, MapError, MapResult};

/// Visual style applied to every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    /// Fraction of the canvas kept empty on each side.
    pub margin_fraction: f64,

    /// Link stroke width in pixels.
    pub link_width: f32,

    /// Fill color of node circles.
    pub node_color: Color,

    /// Canvas background.
    pub background: Color,

    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            margin_fraction: 0.1,
            link_width: 3.0,
            node_color: Color::WHITE,
            background: Color::BLACK,
            jpeg_quality: 75,
        }
    }
}

impl RenderStyle {
    /// Load the style from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut style = Self::default();

        if let Ok(val) = std::env::var("RENDER_MARGIN_FRACTION") {
            if let Ok(margin) = val.parse() {
                style.margin_fraction = margin;
            }
        }

        if let Ok(val) = std::env::var("RENDER_LINK_WIDTH") {
            if let Ok(width) = val.parse() {
                style.link_width = width;
            }
        }

        if let Ok(val) = std::env::var("RENDER_NODE_COLOR") {
            if let Ok(color) = Color::parse(&val) {
                style.node_color = color;
            }
        }

        if let Ok(val) = std::env::var("RENDER_BACKGROUND") {
            if let Ok(color) = Color::parse(&val) {
                style.background = color;
            }
        }

        if let Ok(val) = std::env::var("RENDER_JPEG_QUALITY") {
            if let Ok(quality) = val.parse() {
                style.jpeg_quality = quality;
            }
        }

        style
    }

    /// Validate the style.
    pub fn validate(&self) -> MapResult<()> {
        if !(0.0..0.5).contains(&self.margin_fraction) {
            return Err(MapError::ConfigError(format!(
                "margin_fraction must be in [0, 0.5), got {}",
                self.margin_fraction
            )));
        }
        if !self.link_width.is_finite() || self.link_width <= 0.0 {
            return Err(MapError::ConfigError(format!(
                "link_width must be positive, got {}",
                self.link_width
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MapError::ConfigError(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_is_valid() {
        let style = RenderStyle::default();
        style.validate().unwrap();
        assert_eq!(style.margin_fraction, 0.1);
        assert_eq!(style.link_width, 3.0);
        assert_eq!(style.node_color, Color::WHITE);
        assert_eq!(style.background, Color::BLACK);
    }

    #[test]
    fn test_invalid_styles() {
        let mut style = RenderStyle::default();
        style.margin_fraction = 0.5;
        assert!(style.validate().is_err());

        let mut style = RenderStyle::default();
        style.link_width = 0.0;
        assert!(style.validate().is_err());

        let mut style = RenderStyle::default();
        style.jpeg_quality = 0;
        assert!(style.validate().is_err());
    }

    #[test]
    fn test_style_from_json() {
        let style: RenderStyle = serde_json::from_str(
            r##"{"margin_fraction": 0.05, "link_width": 2, "node_color": "#FFFF00",
                "background": [0, 0, 32], "jpeg_quality": 90}"##,
        )
        .unwrap();
        assert_eq!(style.node_color, Color::YELLOW);
        assert_eq!(style.background, Color::rgb(0, 0, 32));
        style.validate().unwrap();
    }
}
