//! PNG encoding for rendered canvases.
//!
//! Graph renders are drawn without anti-aliasing, so a canvas normally holds
//! only the background, the node color and the handful of load colors. Such
//! images are written as indexed PNG (color type 3): one byte per pixel and
//! far smaller output. Canvases with more than 256 distinct colors fall back
//! to RGBA (color type 6).

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use traffic_common::{MapError, MapResult};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels before palette extraction is split across threads
const PARALLEL_THRESHOLD: usize = 64 * 64;

/// PNG color types written by this encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColorType {
    Indexed = 3,
    Rgba = 6,
}

/// Palette and per-pixel indices for an indexed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub colors: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

/// Encode RGBA pixels, choosing indexed or RGBA output automatically.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let palette = if width * height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette(pixels)
    };

    match palette {
        Some(palette) => encode_png_indexed(width, height, &palette),
        None => encode_png_rgba(pixels, width, height),
    }
}

/// Color type that [`encode_png`] would pick for these pixels.
pub fn preferred_color_type(pixels: &[u8]) -> PngColorType {
    if extract_palette(pixels).is_some() {
        PngColorType::Indexed
    } else {
        PngColorType::Rgba
    }
}

fn check_buffer(pixels: &[u8], width: usize, height: usize) -> MapResult<()> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(MapError::EncodingError(format!(
            "pixel buffer has {} bytes, expected {} for {}x{} RGBA",
            pixels.len(),
            expected,
            width,
            height
        )));
    }
    Ok(())
}

#[inline(always)]
fn pack(pixel: &[u8]) -> u32 {
    u32::from_le_bytes([pixel[0], pixel[1], pixel[2], pixel[3]])
}

/// Sequential palette extraction. `None` when there are more than 256 colors.
pub fn extract_palette(pixels: &[u8]) -> Option<Palette> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut colors: Vec<[u8; 4]> = Vec::with_capacity(16);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for pixel in pixels.chunks_exact(4) {
        let packed = pack(pixel);
        let index = match lookup.get(&packed) {
            Some(&idx) => idx,
            None => {
                if colors.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = colors.len() as u8;
                colors.push([pixel[0], pixel[1], pixel[2], pixel[3]]);
                lookup.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some(Palette { colors, indices })
}

/// Parallel palette extraction for large canvases.
///
/// Rows are scanned in parallel for distinct colors, the sets are merged in
/// first-seen order, then pixels are mapped to indices in parallel.
pub fn extract_palette_parallel(pixels: &[u8]) -> Option<Palette> {
    let chunk_size = (pixels.len() / 4 / rayon::current_num_threads()).max(256) * 4;

    let per_chunk: Vec<Option<Vec<u32>>> = pixels
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut seen: Vec<u32> = Vec::new();
            let mut set: HashMap<u32, ()> = HashMap::new();
            for pixel in chunk.chunks_exact(4) {
                let packed = pack(pixel);
                if set.insert(packed, ()).is_none() {
                    seen.push(packed);
                    if seen.len() > MAX_PALETTE_SIZE {
                        return None;
                    }
                }
            }
            Some(seen)
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut colors: Vec<[u8; 4]> = Vec::new();
    for chunk_colors in per_chunk {
        for packed in chunk_colors? {
            if lookup.contains_key(&packed) {
                continue;
            }
            if colors.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            lookup.insert(packed, colors.len() as u8);
            colors.push(packed.to_le_bytes());
        }
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|pixel| lookup.get(&pack(pixel)).copied().unwrap_or(0))
        .collect();

    Some(Palette { colors, indices })
}

/// Write an indexed PNG (color type 3).
pub fn encode_png_indexed(width: usize, height: usize, palette: &Palette) -> MapResult<Vec<u8>> {
    if palette.indices.len() != width * height {
        return Err(MapError::EncodingError(format!(
            "index buffer has {} entries, expected {}",
            palette.indices.len(),
            width * height
        )));
    }

    let mut png = Vec::with_capacity(palette.indices.len() / 4 + 1024);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, PngColorType::Indexed));

    let plte: Vec<u8> = palette.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.colors.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.colors.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(&palette.indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write an RGBA PNG (color type 6).
pub fn encode_png_rgba(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let mut png = Vec::with_capacity(pixels.len() / 4 + 1024);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, PngColorType::Rgba));

    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: PngColorType) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type as u8;
    // compression, filter and interlace methods stay 0
    data
}

/// Length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut crc = crc32fast::Hasher::new();
    crc.update(chunk_type);
    crc.update(data);
    png.extend_from_slice(&crc.finalize().to_be_bytes());
}

/// Prefix each `row_bytes`-long scanline with filter type 0 and zlib it.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> MapResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| MapError::EncodingError(format!("IDAT compression failed: {}", e)))
}
