//! Image decoding and encoding at the edges of the engine.
//!
//! Images enter as any format the `image` crate reads, get their alpha
//! composited onto a solid background and become normalized color vectors.
//! Quantized results leave as an `RgbImage`.

use crate::config::ImageConfig;
use crate::error::{QuantError, Result};
use crate::recolor::{normalize, pack_rgb, Quantization, Rgb};
use image::{DynamicImage, RgbImage};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Normalized pixel colors of an image.
#[derive(Debug, Clone)]
pub struct ColorExtraction {
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// One `[r, g, b]` vector in `[0, 1]` per pixel, row-major.
    pub colors: Vec<Vec<f64>>,
    /// Number of distinct 8-bit colors.
    pub unique_colors: usize,
}

/// Opens an image and flattens it onto `background`, with default size limits.
pub fn load<P: AsRef<Path>>(path: P, background: Rgb) -> Result<RgbImage> {
    let config = ImageConfig {
        background,
        ..Default::default()
    };
    load_with_config(path, &config)
}

/// Opens an image under the size limits of `config` and flattens it.
///
/// The file size is checked before reading and the resolution is read from
/// the header before decoding, so oversized inputs are never decoded.
pub fn load_with_config<P: AsRef<Path>>(path: P, config: &ImageConfig) -> Result<RgbImage> {
    let path = path.as_ref();

    let file_bytes = fs::metadata(path)?.len();
    if file_bytes > config.max_file_bytes {
        return Err(QuantError::ImageTooLarge(format!(
            "{} is {} bytes, limit is {}",
            path.display(),
            file_bytes,
            config.max_file_bytes
        )));
    }

    let (width, height) = image::image_dimensions(path)?;
    check_resolution(width, height, config.max_total_pixels)?;

    let image = image::open(path)?;
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(flatten(&image, config.background))
}

/// Rejects images with more than `max_total_pixels` pixels.
pub fn check_resolution(width: u32, height: u32, max_total_pixels: u64) -> Result<()> {
    let total = width as u64 * height as u64;
    if total > max_total_pixels {
        return Err(QuantError::ImageTooLarge(format!(
            "{}x{} is {} pixels, limit is {}",
            width, height, total, max_total_pixels
        )));
    }
    Ok(())
}

/// Composites every pixel onto `background`: `out = a * c + (1 - a) * bg`.
pub fn flatten(image: &DynamicImage, background: Rgb) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f64 / 255.0;
        let blend = |c: u8, bg: u8| (alpha * c as f64 + (1.0 - alpha) * bg as f64).round() as u8;
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

/// Extracts normalized colors and counts the distinct ones.
pub fn extract_colors(image: &RgbImage) -> ColorExtraction {
    let mut distinct = HashSet::new();
    let colors = image
        .pixels()
        .map(|pixel| {
            distinct.insert(pack_rgb(pixel.0));
            normalize(pixel.0)
        })
        .collect();

    ColorExtraction {
        width: image.width() as usize,
        height: image.height() as usize,
        colors,
        unique_colors: distinct.len(),
    }
}

/// Builds an image from quantized pixels.
pub fn to_image(quantization: &Quantization) -> Result<RgbImage> {
    let raw: Vec<u8> = quantization.pixels().iter().flatten().copied().collect();
    RgbImage::from_raw(
        quantization.width() as u32,
        quantization.height() as u32,
        raw,
    )
    .ok_or_else(|| {
        QuantError::InvalidArgument(format!(
            "pixel buffer does not fit a {}x{} image",
            quantization.width(),
            quantization.height()
        ))
    })
}

/// Saves an image, choosing the format from the file extension.
pub fn save<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save(path.as_ref())?;
    Ok(())
}

/// Parses `#RRGGBB` or `RRGGBB`.
pub fn parse_hex_color(s: &str) -> Result<Rgb> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(QuantError::Config(format!(
            "invalid color '{}', expected #RRGGBB",
            s
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| QuantError::Config(format!("invalid color '{}': {}", s, e)))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Formats a color as `#rrggbb`.
pub fn format_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
