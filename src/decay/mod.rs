//! Decay schedules for training hyperparameters.
//!
//! A schedule shrinks a scalar (learning rate, neighborhood radius) as the
//! epochs progress.

mod linear;

pub use linear::LinearDecay;

use crate::error::Result;

/// Trait for decay schedules.
pub trait Decay {
    /// Returns the decayed value of `initial` at `epoch` out of `total_epochs`.
    ///
    /// Fails with [`crate::QuantError::InvalidArgument`] when `initial` is
    /// negative or not finite, or when `total_epochs` is zero.
    fn compute(&self, initial: f64, epoch: usize, total_epochs: usize) -> Result<f64>;
}

impl<Y: Decay + ?Sized> Decay for &Y {
    fn compute(&self, initial: f64, epoch: usize, total_epochs: usize) -> Result<f64> {
        (**self).compute(initial, epoch, total_epochs)
    }
}
