//! Linear decay.

use crate::decay::Decay;
use crate::error::{QuantError, Result};

/// Linear decay: `initial * (1 - epoch / total_epochs)`.
///
/// Starts at `initial` for epoch 0 and reaches 0 at `epoch == total_epochs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearDecay;

impl Decay for LinearDecay {
    fn compute(&self, initial: f64, epoch: usize, total_epochs: usize) -> Result<f64> {
        if !initial.is_finite() || initial < 0.0 {
            return Err(QuantError::InvalidArgument(format!(
                "initial value must be a non-negative number, got {}",
                initial
            )));
        }
        if total_epochs == 0 {
            return Err(QuantError::InvalidArgument(
                "total epochs must be greater than zero".to_string(),
            ));
        }

        let coefficient = 1.0 - epoch as f64 / total_epochs as f64;
        Ok(coefficient * initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        let v = LinearDecay.compute(0.5, 5, 10).unwrap();
        assert!((v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(LinearDecay.compute(0.8, 0, 40).unwrap(), 0.8);
        assert_eq!(LinearDecay.compute(0.8, 40, 40).unwrap(), 0.0);
    }

    #[test]
    fn test_monotonic() {
        let total = 25;
        let mut previous = f64::INFINITY;
        for epoch in 0..=total {
            let v = LinearDecay.compute(3.0, epoch, total).unwrap();
            assert!(v <= previous);
            previous = v;
        }
    }

    #[test]
    fn test_zero_initial() {
        assert_eq!(LinearDecay.compute(0.0, 3, 10).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            LinearDecay.compute(-0.1, 0, 10),
            Err(QuantError::InvalidArgument(_))
        ));
        assert!(matches!(
            LinearDecay.compute(0.5, 0, 0),
            Err(QuantError::InvalidArgument(_))
        ));
        assert!(matches!(
            LinearDecay.compute(f64::NAN, 0, 10),
            Err(QuantError::InvalidArgument(_))
        ));
    }
}
