//! The quantizer abstraction shared by the SOM and Mini-Batch K-Means.

use crate::error::{QuantError, Result};
use crate::unit::{Unit, UnitId, UnitKind};
use serde::{Deserialize, Serialize};

/// A unit-based vector quantizer.
///
/// A quantizer is constructed with a fixed number of units, trained once,
/// and then queried and edited. Units are addressed through [`UnitId`]
/// handles; the handles returned by [`Quantizer::units`] alias the live
/// state, so an edit through one handle is visible to every later query.
pub trait Quantizer {
    /// Variant of the units owned by this quantizer.
    fn kind(&self) -> UnitKind;

    /// Number of owned units. Fixed at construction.
    fn unit_count(&self) -> usize;

    /// Length of the vectors this quantizer accepts.
    fn input_dimension(&self) -> usize;

    /// Trains all units on `data` for at most `epochs` epochs.
    ///
    /// Fails with [`QuantError::InvalidTrainingData`] if `data` is empty or
    /// holds fewer rows than there are units, and with
    /// [`QuantError::DimensionMismatch`] if any row has the wrong length.
    /// Both checks happen before any unit is touched.
    fn train(&mut self, data: &[Vec<f64>], epochs: usize) -> Result<TrainingReport>;

    /// Returns the unit closest to `input`.
    ///
    /// Exhaustive scan in enumeration order; on ties the first unit wins.
    fn find_closest_unit(&self, input: &[f64]) -> Result<UnitId>;

    /// Coordinates of an owned unit.
    fn unit_coordinates(&self, unit: UnitId) -> Result<&[f64]>;

    /// Replaces the coordinates of an owned unit.
    ///
    /// Checks, in order: variant ([`QuantError::InvalidUnitType`]),
    /// ownership ([`QuantError::ForeignUnit`]) and length
    /// ([`QuantError::DimensionMismatch`]).
    fn update_unit_coordinates(&mut self, unit: UnitId, coordinates: &[f64]) -> Result<()>;

    /// Handles to all owned units in enumeration order.
    fn units(&self) -> Vec<UnitId>;

    /// Copies `units[i]`'s coordinates into the owned unit at index `i`.
    ///
    /// Fails with [`QuantError::CardinalityMismatch`] on a length mismatch
    /// and with [`QuantError::InvalidUnitType`] if any element is of the
    /// wrong variant.
    fn set_units(&mut self, units: &[Unit]) -> Result<()>;

    /// Detached copies of all units.
    fn units_deep_copy(&self) -> Vec<Unit>;
}

/// Summary of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Mini-batch size used for every epoch.
    pub batch_size: usize,
    /// Number of epochs actually run.
    pub epochs_run: usize,
    /// Whether training stopped early on convergence.
    pub converged: bool,
    /// Learning rate in effect at each epoch.
    pub learning_rates: Vec<f64>,
    /// Neighborhood radius in effect at each epoch (SOM only).
    pub radii: Vec<f64>,
}

/// Shared precondition checks for `train`.
pub(crate) fn validate_training_data(
    data: &[Vec<f64>],
    unit_count: usize,
    input_dimension: usize,
) -> Result<()> {
    if data.is_empty() {
        return Err(QuantError::InvalidTrainingData(
            "training data cannot be empty".to_string(),
        ));
    }
    if data.len() < unit_count {
        return Err(QuantError::InvalidTrainingData(format!(
            "training data has {} rows, fewer than the {} units",
            data.len(),
            unit_count
        )));
    }
    if let Some(row) = data.iter().find(|row| row.len() != input_dimension) {
        return Err(QuantError::dimension(input_dimension, row.len()));
    }
    Ok(())
}

/// Index of the vector closest to `input`, first minimum wins.
pub(crate) fn closest_index<'a, D, I>(distance: &D, input: &[f64], candidates: I) -> Result<usize>
where
    D: crate::distance::Distance + ?Sized,
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.into_iter().enumerate() {
        let dist = distance.compute(input, candidate)?;
        if best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((i, dist));
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| QuantError::InvalidArgument("quantizer has no units".to_string()))
}
