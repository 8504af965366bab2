//! Error types for the chromaquant engine.

use crate::unit::UnitKind;
use thiserror::Error;

/// The main error type for quantization operations.
#[derive(Error, Debug)]
pub enum QuantError {
    /// Malformed argument to a distance, decay or recoloring call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two vectors that must agree in length do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected vector length.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

    /// Training set is empty or smaller than the number of units.
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    /// A unit of the wrong variant was handed to a quantizer.
    #[error("Invalid unit type: expected {expected}, got {actual}")]
    InvalidUnitType {
        /// The variant owned by the quantizer.
        expected: UnitKind,
        /// The variant that was supplied.
        actual: UnitKind,
    },

    /// The unit handle belongs to another quantizer instance.
    #[error("Unit does not belong to this {0} instance")]
    ForeignUnit(&'static str),

    /// `set_units` was called with the wrong number of units.
    #[error("Cardinality mismatch: expected {expected} units, got {actual}")]
    CardinalityMismatch {
        /// The number of units owned by the quantizer.
        expected: usize,
        /// The number of units supplied.
        actual: usize,
    },

    /// The input image exceeds the accepted file size or resolution.
    #[error("Image too large: {0}")]
    ImageTooLarge(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for quantization operations.
pub type Result<T> = std::result::Result<T, QuantError>;

impl QuantError {
    /// Shorthand for a [`QuantError::DimensionMismatch`].
    pub(crate) fn dimension(expected: usize, actual: usize) -> Self {
        QuantError::DimensionMismatch { expected, actual }
    }
}
