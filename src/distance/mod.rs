//! Distance measures between vectors.
//!
//! The same measure serves two purposes: nearest-unit search over color
//! vectors, and neighborhood distance between SOM grid positions. It must
//! therefore work for any vector length.

mod euclidean;

pub use euclidean::Euclidean;

use crate::error::{QuantError, Result};

/// Trait for distance measures between vectors of equal length.
pub trait Distance {
    /// Computes the distance between `a` and `b`.
    ///
    /// Fails with [`QuantError::DimensionMismatch`] when the lengths differ.
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64>;
}

impl<D: Distance + ?Sized> Distance for &D {
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        (**self).compute(a, b)
    }
}

/// Checks that two vectors have the same length.
#[inline]
pub(crate) fn ensure_same_length(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(QuantError::dimension(a.len(), b.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_same_length() {
        assert!(ensure_same_length(&[1.0, 2.0], &[3.0, 4.0]).is_ok());

        let err = ensure_same_length(&[1.0, 2.0, 3.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            QuantError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_distance_through_reference() {
        let measure = Euclidean;
        let by_ref: &dyn Distance = &measure;
        let d = by_ref.compute(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-10);
    }
}
