//! # ChromaQuant - Color Quantization Engine
//!
//! ChromaQuant reduces the colors of an image to a small learned palette
//! using unsupervised vector quantization.
//!
//! ## Overview
//!
//! Pixels are treated as points in normalized RGB space. A quantizer owns a
//! fixed set of units (grid nodes or centroids), trains them on mini-batches
//! sampled from the image, and then maps every pixel to its nearest unit.
//!
//! ## Key Features
//!
//! - **Self-Organizing Map (SOM)** with a Gaussian neighborhood on a 2D grid
//! - **Mini-Batch K-Means** with early stopping on convergence
//! - **Pluggable distance and decay strategies**
//! - **Cached recoloring**: one nearest-unit search per distinct color
//! - **Palette editing** that repaints without retraining, with reset
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chromaquant::{imaging, recolor, QuantizerConfig};
//!
//! let image = imaging::load("photo.png", [255, 255, 255])?;
//! let extraction = imaging::extract_colors(&image);
//!
//! let config = QuantizerConfig::default();
//! let mut quantizer = config.build(3)?;
//! quantizer.train(&extraction.colors, config.epochs)?;
//!
//! let result = recolor::quantize(quantizer.as_ref(), &extraction.colors, extraction.width)?;
//! println!("MSQE: {:.2}", result.msqe());
//! imaging::save(&imaging::to_image(&result)?, "photo-16.png")?;
//! ```
//!
//! ## Architecture
//!
//! - [`distance`] - Distance strategies
//! - [`decay`] - Learning-rate and radius decay strategies
//! - [`batch`] - Mini-batch sampling
//! - [`unit`] - Units and the handles that address them
//! - [`quantizer`] - The quantizer trait
//! - [`som`] - Self-Organizing Map
//! - [`kmeans`] - Mini-Batch K-Means
//! - [`recolor`] - Applying a trained quantizer and editing its palette
//! - [`imaging`] - Image loading and saving

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod config;
pub mod decay;
pub mod distance;
pub mod error;
pub mod imaging;
pub mod kmeans;
pub mod quantizer;
pub mod recolor;
pub mod som;
pub mod unit;

// Re-export commonly used types
pub use config::{Algorithm, Config, ImageConfig, QuantizerConfig};
pub use decay::{Decay, LinearDecay};
pub use distance::{Distance, Euclidean};
pub use error::{QuantError, Result};
pub use kmeans::{Centroid, MiniBatchKMeans};
pub use quantizer::{Quantizer, TrainingReport};
pub use recolor::{quantize, PaletteEntry, PaletteSession, Quantization, QuantizationSummary, Rgb};
pub use som::{GridNode, Som};
pub use unit::{Unit, UnitId, UnitKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_boxed_quantizer_drives_recoloring() {
        let colors: Vec<Vec<f64>> = (0..32)
            .map(|i| vec![(i % 4) as f64 / 3.0, (i % 8) as f64 / 7.0, 0.5])
            .collect();
        let config = QuantizerConfig {
            algorithm: Algorithm::MiniBatchKMeans,
            epochs: 100,
            k: 4,
            seed: Some(3),
            ..Default::default()
        };
        let mut quantizer = config.build(3).unwrap();
        quantizer.train(&colors, config.epochs).unwrap();

        let result = quantize(quantizer.as_ref(), &colors, 8).unwrap();
        assert_eq!(result.height(), 4);
        assert!(result.color_count() <= 4);
        assert_eq!(result.lookups(), 8);
    }
}
