//! Encoding rendered canvases into image file formats.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

use traffic_common::{MapError, MapResult};

use crate::png;
use crate::raster::RenderedImage;

/// Image formats a render can be encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
}

impl OutputFormat {
    /// Parse a format name, case-insensitively. `jpg` is accepted for JPEG.
    pub fn parse(name: &str) -> MapResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "bmp" => Ok(OutputFormat::Bmp),
            _ => Err(MapError::UnsupportedFormat(name.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Bmp => "bmp",
        };
        write!(f, "{}", name)
    }
}

/// Encode a canvas. `jpeg_quality` is only used for JPEG.
pub fn encode(image: &RenderedImage, format: OutputFormat, jpeg_quality: u8) -> MapResult<Vec<u8>> {
    match format {
        OutputFormat::Png => {
            png::encode_png(&image.pixels, image.width as usize, image.height as usize)
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = RgbImage::from_fn(image.width, image.height, |x, y| {
                let idx = (y as usize * image.width as usize + x as usize) * 4;
                Rgb([image.pixels[idx], image.pixels[idx + 1], image.pixels[idx + 2]])
            });
            write_with_image(DynamicImage::ImageRgb8(rgb), ImageOutputFormat::Jpeg(jpeg_quality))
        }
        OutputFormat::Bmp => {
            let rgba = to_rgba_image(image)?;
            write_with_image(DynamicImage::ImageRgba8(rgba), ImageOutputFormat::Bmp)
        }
    }
}

fn to_rgba_image(image: &RenderedImage) -> MapResult<RgbaImage> {
    RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or_else(|| {
        MapError::EncodingError(format!(
            "pixel buffer does not match {}x{}",
            image.width, image.height
        ))
    })
}

fn write_with_image(image: DynamicImage, format: ImageOutputFormat) -> MapResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|e| MapError::EncodingError(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Decode encoded image bytes back into RGBA pixels.
pub fn decode(bytes: &[u8]) -> MapResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| MapError::EncodingError(format!("failed to decode image: {}", e)))
}
