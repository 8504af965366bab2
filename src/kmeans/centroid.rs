//! K-Means centroids.

use crate::error::{QuantError, Result};
use serde::{Deserialize, Serialize};

/// A cluster centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    coordinates: Vec<f64>,
}

impl Centroid {
    /// Creates a centroid at the given coordinates.
    pub fn new(coordinates: Vec<f64>) -> Self {
        Self { coordinates }
    }

    /// Creates a centroid at the origin.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            coordinates: vec![0.0; dimension],
        }
    }

    /// The centroid's coordinates.
    #[inline]
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// Overwrites the coordinates. The length must not change.
    pub fn set_coordinates(&mut self, coordinates: &[f64]) -> Result<()> {
        if coordinates.len() != self.coordinates.len() {
            return Err(QuantError::dimension(
                self.coordinates.len(),
                coordinates.len(),
            ));
        }
        self.coordinates.copy_from_slice(coordinates);
        Ok(())
    }

    /// Moves the centroid towards `target`: `c = (1 - lr) * c + lr * target`.
    pub(crate) fn blend_towards(&mut self, target: &[f64], learning_rate: f64) {
        for (c, t) in self.coordinates.iter_mut().zip(target.iter()) {
            *c = (1.0 - learning_rate) * *c + learning_rate * t;
        }
    }
}
