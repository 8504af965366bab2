//! Applying a trained quantizer to an image.
//!
//! [`quantize`] maps every pixel to its nearest unit. Nearest-unit searches
//! and their squared errors are memoized per distinct input color for the
//! duration of one pass, so an image with `N` pixels and `U` distinct colors
//! costs `U` searches and `U` distance computations rather than `N`. The
//! pass also records which pixels each unit owns, which is what palette
//! edits repaint.

use crate::distance::{Distance, Euclidean};
use crate::error::{QuantError, Result};
use crate::quantizer::Quantizer;
use crate::unit::{Unit, UnitId};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An 8-bit RGB color.
pub type Rgb = [u8; 3];

/// Scale between normalized channels and 8-bit channels.
const CHANNEL_MAX: f64 = 255.0;

/// Converts normalized coordinates to an 8-bit color.
///
/// Each channel is `round(c * 255)` clamped to `[0, 255]`.
pub fn to_rgb(coordinates: &[f64]) -> Result<Rgb> {
    if coordinates.len() != 3 {
        return Err(QuantError::dimension(3, coordinates.len()));
    }
    let channel = |c: f64| (c * CHANNEL_MAX).round().clamp(0.0, CHANNEL_MAX) as u8;
    Ok([
        channel(coordinates[0]),
        channel(coordinates[1]),
        channel(coordinates[2]),
    ])
}

/// Converts an 8-bit color to normalized coordinates in `[0, 1]`.
pub fn normalize(rgb: Rgb) -> Vec<f64> {
    rgb.iter().map(|&c| c as f64 / CHANNEL_MAX).collect()
}

/// Packs a color into `0xRRGGBB`.
#[inline]
pub fn pack_rgb(rgb: Rgb) -> u32 {
    (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
}

/// One color of the learned palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// The unit holding this color.
    pub unit: UnitId,
    /// Current color of the unit.
    pub color: Rgb,
    /// Number of pixels the unit represents.
    pub pixel_count: usize,
}

/// Result of one quantization pass over an image.
#[derive(Debug, Clone)]
pub struct Quantization {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    partition: BTreeMap<UnitId, Vec<(u32, u32)>>,
    msqe: f64,
    lookups: usize,
}

/// Maps every pixel of an image to its nearest unit.
///
/// `colors` holds one normalized RGB vector per pixel in row-major order and
/// must be a whole number of rows of `width` pixels.
pub fn quantize<Q>(quantizer: &Q, colors: &[Vec<f64>], width: usize) -> Result<Quantization>
where
    Q: Quantizer + ?Sized,
{
    if width == 0 && !colors.is_empty() {
        return Err(QuantError::InvalidArgument(
            "image width must be greater than zero".to_string(),
        ));
    }
    if width > 0 && colors.len() % width != 0 {
        return Err(QuantError::InvalidArgument(format!(
            "{} pixels do not form rows of width {}",
            colors.len(),
            width
        )));
    }
    let height = if width == 0 { 0 } else { colors.len() / width };

    let mut cache: HashMap<u32, (UnitId, Rgb, f64)> = HashMap::new();
    let mut pixels = Vec::with_capacity(colors.len());
    let mut partition: BTreeMap<UnitId, Vec<(u32, u32)>> = BTreeMap::new();
    let mut total_squared_error = 0.0;
    let mut lookups = 0;

    for (index, color) in colors.iter().enumerate() {
        let key = pack_rgb(to_rgb(color)?);

        let (unit, rgb, squared_error) = match cache.get(&key) {
            Some(&hit) => hit,
            None => {
                let unit = quantizer.find_closest_unit(color)?;
                let coordinates = quantizer.unit_coordinates(unit)?;
                let error = Euclidean.compute(color, coordinates)?;
                let entry = (unit, to_rgb(coordinates)?, error * error);
                lookups += 1;
                cache.insert(key, entry);
                entry
            }
        };
        total_squared_error += squared_error;

        pixels.push(rgb);
        let x = (index % width) as u32;
        let y = (index / width) as u32;
        partition.entry(unit).or_default().push((x, y));
    }

    let msqe = if colors.is_empty() {
        0.0
    } else {
        total_squared_error / colors.len() as f64 * CHANNEL_MAX * CHANNEL_MAX
    };

    debug!(
        "Quantized {} pixels with {} nearest-unit searches into {} colors",
        colors.len(),
        lookups,
        partition.len()
    );

    Ok(Quantization {
        width,
        height,
        pixels,
        partition,
        msqe,
        lookups,
    })
}

impl Quantization {
    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Quantized colors in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Quantized color at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Unit to owned-pixel mapping, in unit enumeration order.
    #[inline]
    pub fn partition(&self) -> &BTreeMap<UnitId, Vec<(u32, u32)>> {
        &self.partition
    }

    /// Pixels owned by `unit`, in scan order.
    pub fn unit_pixels(&self, unit: UnitId) -> &[(u32, u32)] {
        self.partition.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mean squared quantization error, in 8-bit channel units.
    #[inline]
    pub fn msqe(&self) -> f64 {
        self.msqe
    }

    /// Number of nearest-unit searches performed by the pass.
    #[inline]
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Number of units that represent at least one pixel.
    #[inline]
    pub fn color_count(&self) -> usize {
        self.partition.len()
    }

    /// The learned palette: every unit that owns pixels, with its current color.
    pub fn palette<Q>(&self, quantizer: &Q) -> Result<Vec<PaletteEntry>>
    where
        Q: Quantizer + ?Sized,
    {
        self.partition
            .iter()
            .map(|(&unit, pixels)| {
                Ok(PaletteEntry {
                    unit,
                    color: to_rgb(quantizer.unit_coordinates(unit)?)?,
                    pixel_count: pixels.len(),
                })
            })
            .collect()
    }

    /// Gives `unit` a new color and repaints the pixels it owns.
    ///
    /// Pixels are not reassigned and nothing is retrained. Returns the
    /// number of repainted pixels.
    pub fn recolor_unit<Q>(&mut self, quantizer: &mut Q, unit: UnitId, color: Rgb) -> Result<usize>
    where
        Q: Quantizer + ?Sized,
    {
        quantizer.update_unit_coordinates(unit, &normalize(color))?;

        let Some(owned) = self.partition.get(&unit) else {
            return Ok(0);
        };
        for &(x, y) in owned {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
        Ok(owned.len())
    }
}

/// Snapshot taken right after quantization, for undoing palette edits.
#[derive(Debug, Clone)]
pub struct PaletteSession {
    units: Vec<Unit>,
    pixels: Vec<Rgb>,
}

impl PaletteSession {
    /// Captures the quantizer's units and the quantized pixels.
    pub fn capture<Q>(quantizer: &Q, quantization: &Quantization) -> Self
    where
        Q: Quantizer + ?Sized,
    {
        Self {
            units: quantizer.units_deep_copy(),
            pixels: quantization.pixels.clone(),
        }
    }

    /// Restores the captured units and pixels, discarding every edit since.
    pub fn reset<Q>(&self, quantizer: &mut Q, quantization: &mut Quantization) -> Result<()>
    where
        Q: Quantizer + ?Sized,
    {
        if quantization.pixels.len() != self.pixels.len() {
            return Err(QuantError::InvalidArgument(format!(
                "snapshot holds {} pixels, image has {}",
                self.pixels.len(),
                quantization.pixels.len()
            )));
        }
        quantizer.set_units(&self.units)?;
        quantization.pixels.copy_from_slice(&self.pixels);
        Ok(())
    }
}

/// Summary of a quantization pass, as reported by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationSummary {
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// Colors present in the quantized image.
    pub color_count: usize,
    /// Nearest-unit searches performed.
    pub lookups: usize,
    /// Mean squared quantization error.
    pub msqe: f64,
}

impl From<&Quantization> for QuantizationSummary {
    fn from(q: &Quantization) -> Self {
        Self {
            width: q.width,
            height: q.height,
            color_count: q.color_count(),
            lookups: q.lookups,
            msqe: q.msqe,
        }
    }
}

impl fmt::Display for QuantizationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Size:    {}x{}", self.width, self.height)?;
        writeln!(f, "  Colors:  {}", self.color_count)?;
        writeln!(f, "  Lookups: {}", self.lookups)?;
        writeln!(f, "  MSQE:    {:.4}", self.msqe)
    }
}
