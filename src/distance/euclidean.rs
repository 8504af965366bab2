//! Euclidean distance.

use crate::distance::{ensure_same_length, Distance};
use crate::error::Result;

/// Euclidean (L2) distance.
///
/// `sqrt(sum((a[i] - b[i])^2))`
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Euclidean {
    /// Squared Euclidean distance, skipping the square root.
    ///
    /// Callers must have checked that the lengths agree.
    #[inline]
    pub(crate) fn squared_unchecked(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

impl Distance for Euclidean {
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        ensure_same_length(a, b)?;
        Ok(Self::squared_unchecked(a, b).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuantError;

    #[test]
    fn test_known_value() {
        let d = Euclidean.compute(&[0.1, 0.2, 0.3], &[0.4, 0.5, 0.6]).unwrap();
        assert!((d - (0.09f64 + 0.09 + 0.09).sqrt()).abs() < 1e-10);
        assert!((d - 0.5196).abs() < 1e-4);
    }

    #[test]
    fn test_identical() {
        let a = [0.25, 0.5, 0.75];
        assert_eq!(Euclidean.compute(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = [0.9, 0.1, 0.4];
        let b = [0.2, 0.7, 0.3];
        let ab = Euclidean.compute(&a, &b).unwrap();
        let ba = Euclidean.compute(&b, &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_grid_positions() {
        // 3-4-5 triangle on a 2-D grid
        let d = Euclidean.compute(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_vectors() {
        assert_eq!(Euclidean.compute(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Euclidean.compute(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, QuantError::DimensionMismatch { .. }));
    }
}
