//! Color representation for rendering.
//!
//! Colors are written in configuration as a hex string (`"#RRGGBB"` or
//! `"#RRGGBBAA"`), a named color, or an `[r, g, b]` / `[r, g, b, a]` array.
//! Unknown names and malformed hex are errors.

use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GREY: Color = Color::rgb(128, 128, 128);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const DARK_RED: Color = Color::rgb(128, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex string or a color name.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            parse_hex_color(trimmed)
        } else {
            named_color(trimmed).ok_or_else(|| ColorError::UnknownName(trimmed.to_string()))
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Wire forms accepted for a color.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// Hex string or named color
    Text(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),
}

impl TryFrom<ColorSpec> for Color {
    type Error = ColorError;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Text(s) => Color::parse(&s),
            ColorSpec::Array(arr) => match arr.as_slice() {
                [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Color::rgba(*r, *g, *b, *a)),
                _ => Err(ColorError::InvalidArray(arr.len())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0}")]
    InvalidHex(String),

    #[error("Unknown color name: {0}")]
    UnknownName(String),

    #[error("Color array must have 3 or 4 components, got {0}")]
    InvalidArray(usize),
}

fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    let hex = s.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(|| ColorError::InvalidHex(s.to_string()))
    };

    match hex.len() {
        6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => Err(ColorError::InvalidHex(s.to_string())),
    }
}

// Values follow the X11/CSS table used by common imaging libraries, so
// "green" is (0, 128, 0) rather than pure (0, 255, 0).
fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_lowercase().replace(|c: char| matches!(c, '-' | '_' | ' '), "").as_str() {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "gray" | "grey" => Color::GREY,
        "green" => Color::GREEN,
        "lime" => Color::rgb(0, 255, 0),
        "yellow" => Color::YELLOW,
        "orange" => Color::rgb(255, 165, 0),
        "red" => Color::RED,
        "darkred" => Color::rgb(139, 0, 0),
        "maroon" => Color::DARK_RED,
        "blue" => Color::rgb(0, 0, 255),
        "transparent" => Color::rgba(0, 0, 0, 0),
        _ => return None,
    };
    Some(color)
}
