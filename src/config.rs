//! Configuration for the ChromaQuant engine.

use crate::error::{QuantError, Result};
use crate::kmeans::MiniBatchKMeans;
use crate::quantizer::Quantizer;
use crate::som::Som;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted training epochs.
pub const EPOCH_RANGE: RangeInclusive<usize> = 100..=10_000;

/// Accepted SOM grid side length.
pub const MAP_SIDE_RANGE: RangeInclusive<usize> = 1..=16;

/// Accepted number of K-Means clusters.
pub const CLUSTER_RANGE: RangeInclusive<usize> = 1..=256;

/// Dimension of the color vectors fed to the quantizers.
pub const COLOR_DIMENSION: usize = 3;

/// Largest accepted input file, in bytes (50 MiB).
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Largest accepted `width * height` of an input image.
pub const MAX_TOTAL_PIXELS: u64 = 49_000_000;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Quantizer selection and training parameters.
    pub quantizer: QuantizerConfig,

    /// Image loading configuration.
    pub image: ImageConfig,
}

impl Config {
    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        self.quantizer.validate()
    }
}

/// Quantization algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Self-Organizing Map.
    #[default]
    Som,
    /// Mini-Batch K-Means.
    MiniBatchKMeans,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Som => write!(f, "som"),
            Algorithm::MiniBatchKMeans => write!(f, "mini-batch-k-means"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "som" => Ok(Algorithm::Som),
            "mini-batch-k-means" | "kmeans" | "k-means" => Ok(Algorithm::MiniBatchKMeans),
            other => Err(QuantError::Config(format!(
                "unknown algorithm '{}', expected 'som' or 'mini-batch-k-means'",
                other
            ))),
        }
    }
}

/// Quantizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizerConfig {
    /// Which quantizer to train.
    /// Default: SOM.
    pub algorithm: Algorithm,

    /// Number of training epochs.
    /// Default: 500.
    pub epochs: usize,

    /// SOM grid width.
    /// Default: 4.
    pub map_width: usize,

    /// SOM grid height.
    /// Default: 4.
    pub map_height: usize,

    /// Number of K-Means clusters.
    /// Default: 16.
    pub k: usize,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Som,
            epochs: 500,
            map_width: 4,
            map_height: 4,
            k: 16,
            seed: None,
        }
    }
}

impl QuantizerConfig {
    /// Number of units the configured quantizer will own.
    #[inline]
    pub fn unit_count(&self) -> usize {
        match self.algorithm {
            Algorithm::Som => self.map_width * self.map_height,
            Algorithm::MiniBatchKMeans => self.k,
        }
    }

    /// Checks parameters against their accepted ranges.
    ///
    /// Only the parameters of the selected algorithm are checked.
    pub fn validate(&self) -> Result<()> {
        check_range("epochs", self.epochs, &EPOCH_RANGE)?;
        match self.algorithm {
            Algorithm::Som => {
                check_range("map width", self.map_width, &MAP_SIDE_RANGE)?;
                check_range("map height", self.map_height, &MAP_SIDE_RANGE)?;
            }
            Algorithm::MiniBatchKMeans => check_range("k", self.k, &CLUSTER_RANGE)?,
        }
        Ok(())
    }

    /// Requires strictly more distinct colors than units.
    pub fn ensure_enough_colors(&self, unique_colors: usize) -> Result<()> {
        let units = self.unit_count();
        if unique_colors <= units {
            return Err(QuantError::InvalidTrainingData(format!(
                "image has {} distinct colors, need more than {} to quantize",
                unique_colors, units
            )));
        }
        Ok(())
    }

    /// Validates and constructs the configured quantizer.
    pub fn build(&self, input_dimension: usize) -> Result<Box<dyn Quantizer>> {
        self.validate()?;
        if input_dimension == 0 {
            return Err(QuantError::Config(
                "input dimension must be greater than zero".to_string(),
            ));
        }
        let quantizer: Box<dyn Quantizer> = match self.algorithm {
            Algorithm::Som => Box::new(Som::new(
                input_dimension,
                self.map_width,
                self.map_height,
                self.seed,
            )),
            Algorithm::MiniBatchKMeans => {
                Box::new(MiniBatchKMeans::new(self.k, input_dimension, self.seed))
            }
        };
        Ok(quantizer)
    }
}

fn check_range(name: &str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if !range.contains(&value) {
        return Err(QuantError::Config(format!(
            "{} must be in {}..={}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )));
    }
    Ok(())
}

/// Image loading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Color that transparent pixels are composited onto.
    /// Default: white.
    pub background: [u8; 3],

    /// Largest accepted input file in bytes.
    /// Default: 50 MiB.
    pub max_file_bytes: u64,

    /// Largest accepted pixel count.
    /// Default: 49,000,000.
    pub max_total_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            max_file_bytes: MAX_FILE_BYTES,
            max_total_pixels: MAX_TOTAL_PIXELS,
        }
    }
}
