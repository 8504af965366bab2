//! Mini-Batch K-Means implementation.

use crate::batch;
use crate::decay::{Decay, LinearDecay};
use crate::distance::{Distance, Euclidean};
use crate::error::Result;
use crate::kmeans::Centroid;
use crate::quantizer::{closest_index, validate_training_data, Quantizer, TrainingReport};
use crate::unit::{Ownership, Unit, UnitId, UnitKind};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Initial learning rate of every Mini-Batch K-Means instance.
pub const KMEANS_INITIAL_LEARNING_RATE: f64 = 0.5;

/// Training stops once no centroid moves further than this in an epoch.
pub const CONVERGENCE_THRESHOLD: f64 = 0.0001;

/// Mini-Batch K-Means quantizer.
///
/// A K-Means variant that updates its centroids from a small random sample
/// of the training set each epoch. Each centroid moves part of the way
/// towards the mean of the sample points assigned to it, and training stops
/// early once every updated centroid has settled.
///
/// The `k` centroids exist from construction on (at the origin) and are
/// seeded from random training rows when [`Quantizer::train`] starts.
#[derive(Debug)]
pub struct MiniBatchKMeans<D = Euclidean, Y = LinearDecay> {
    k: usize,
    input_dimension: usize,
    centroids: Vec<Centroid>,
    /// Per cluster, the mini-batch positions assigned to it this epoch.
    assignments: Vec<Vec<usize>>,
    initial_learning_rate: f64,
    convergence_threshold: f64,
    distance: D,
    decay: Y,
    rng: ChaCha8Rng,
    ownership: Ownership,
}

impl MiniBatchKMeans {
    /// Creates `k` clusters with Euclidean distance and linear decay.
    ///
    /// With `seed: None` the random source is seeded from the OS.
    pub fn new(k: usize, input_dimension: usize, seed: Option<u64>) -> Self {
        Self::with_strategies(k, input_dimension, Euclidean, LinearDecay, seed)
    }
}

impl<D: Distance, Y: Decay> MiniBatchKMeans<D, Y> {
    /// Creates `k` clusters with custom distance and decay strategies.
    pub fn with_strategies(
        k: usize,
        input_dimension: usize,
        distance: D,
        decay: Y,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(k, input_dimension, distance, decay, rng)
    }

    /// Creates `k` clusters drawing all randomness from `rng`.
    pub fn with_rng(k: usize, input_dimension: usize, distance: D, decay: Y, rng: ChaCha8Rng) -> Self {
        Self {
            k,
            input_dimension,
            centroids: (0..k).map(|_| Centroid::zeros(input_dimension)).collect(),
            assignments: vec![Vec::new(); k],
            initial_learning_rate: KMEANS_INITIAL_LEARNING_RATE,
            convergence_threshold: CONVERGENCE_THRESHOLD,
            distance,
            decay,
            rng,
            ownership: Ownership::new(UnitKind::Centroid, k, "Mini-Batch K-Means"),
        }
    }

    /// Number of clusters.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Gets an owned centroid through its handle.
    pub fn centroid(&self, unit: UnitId) -> Result<&Centroid> {
        let index = self.ownership.resolve(unit)?;
        Ok(&self.centroids[index])
    }

    /// Places every centroid on a uniformly chosen row of `data`.
    fn seed_centroids(&mut self, data: &[Vec<f64>]) -> Result<()> {
        for centroid in self.centroids.iter_mut() {
            let row = &data[self.rng.gen_range(0..data.len())];
            centroid.set_coordinates(row)?;
        }
        Ok(())
    }

    fn nearest_cluster(&self, input: &[f64]) -> Result<usize> {
        closest_index(
            &self.distance,
            input,
            self.centroids.iter().map(|c| c.coordinates()),
        )
    }

    /// Assigns every mini-batch point to its nearest cluster.
    fn assign(&mut self, mini_batch: &[&Vec<f64>]) -> Result<()> {
        for members in self.assignments.iter_mut() {
            members.clear();
        }
        for (position, point) in mini_batch.iter().enumerate() {
            let cluster = self.nearest_cluster(point)?;
            self.assignments[cluster].push(position);
        }
        Ok(())
    }

    /// Moves each non-empty cluster towards the mean of its points.
    ///
    /// Returns `true` when no updated centroid moved further than the
    /// convergence threshold. Empty clusters are left untouched.
    fn update_centroids(&mut self, mini_batch: &[&Vec<f64>], learning_rate: f64) -> Result<bool> {
        let mut converged = true;
        let mut mean = vec![0.0; self.input_dimension];

        for (centroid, members) in self.centroids.iter_mut().zip(&self.assignments) {
            if members.is_empty() {
                continue;
            }

            mean.iter_mut().for_each(|m| *m = 0.0);
            for &position in members {
                for (m, v) in mean.iter_mut().zip(mini_batch[position].iter()) {
                    *m += v;
                }
            }
            let count = members.len() as f64;
            mean.iter_mut().for_each(|m| *m /= count);

            let previous = centroid.coordinates().to_vec();
            centroid.blend_towards(&mean, learning_rate);

            let movement = self.distance.compute(&previous, centroid.coordinates())?;
            if movement > self.convergence_threshold {
                converged = false;
            }
        }

        Ok(converged)
    }
}

impl<D: Distance, Y: Decay> Quantizer for MiniBatchKMeans<D, Y> {
    fn kind(&self) -> UnitKind {
        UnitKind::Centroid
    }

    fn unit_count(&self) -> usize {
        self.ownership.len()
    }

    fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    fn train(&mut self, data: &[Vec<f64>], epochs: usize) -> Result<TrainingReport> {
        validate_training_data(data, self.k, self.input_dimension)?;
        self.seed_centroids(data)?;

        let batch_size = batch::batch_size_for(data.len());
        let mut learning_rate = self.initial_learning_rate;
        let mut report = TrainingReport {
            batch_size,
            ..Default::default()
        };

        info!(
            "Training Mini-Batch K-Means: {} samples, k={}, {} epochs, batch size {}",
            data.len(),
            self.k,
            epochs,
            batch_size
        );
        let log_every = (epochs / 10).max(1);

        for epoch in 0..epochs {
            if epoch % log_every == 0 {
                info!("Epoch {}/{}: lr={:.4}", epoch + 1, epochs, learning_rate);
            } else {
                debug!("Epoch {}/{}: lr={:.4}", epoch + 1, epochs, learning_rate);
            }
            report.learning_rates.push(learning_rate);

            let mini_batch = batch::sample(data, batch_size, &mut self.rng);
            self.assign(&mini_batch)?;
            let converged = self.update_centroids(&mini_batch, learning_rate)?;
            report.epochs_run = epoch + 1;

            if converged {
                info!("Converged at epoch {}", epoch + 1);
                report.converged = true;
                break;
            }

            learning_rate = self.decay.compute(self.initial_learning_rate, epoch, epochs)?;
        }

        if !report.converged {
            info!("Reached maximum epochs without convergence");
        }
        Ok(report)
    }

    fn find_closest_unit(&self, input: &[f64]) -> Result<UnitId> {
        let index = self.nearest_cluster(input)?;
        Ok(self.ownership.handle(index))
    }

    fn unit_coordinates(&self, unit: UnitId) -> Result<&[f64]> {
        Ok(self.centroid(unit)?.coordinates())
    }

    fn update_unit_coordinates(&mut self, unit: UnitId, coordinates: &[f64]) -> Result<()> {
        let index = self.ownership.resolve(unit)?;
        self.centroids[index].set_coordinates(coordinates)
    }

    fn units(&self) -> Vec<UnitId> {
        self.ownership.handles()
    }

    fn set_units(&mut self, units: &[Unit]) -> Result<()> {
        self.ownership.check_replacement(units, self.input_dimension)?;
        for (centroid, unit) in self.centroids.iter_mut().zip(units) {
            centroid.set_coordinates(unit.coordinates())?;
        }
        Ok(())
    }

    fn units_deep_copy(&self) -> Vec<Unit> {
        self.centroids.iter().cloned().map(Unit::Centroid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuantError;
    use crate::som::{GridNode, Som};

    fn training_data() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 1.0, 1.0],
            vec![0.5, 0.5, 0.5],
            vec![0.8, 0.8, 0.8],
        ]
    }

    fn trained() -> MiniBatchKMeans {
        let mut kmeans = MiniBatchKMeans::new(3, 3, Some(42));
        kmeans.train(&training_data(), 10).unwrap();
        kmeans
    }

    #[test]
    fn test_train_valid_input() {
        let mut kmeans = MiniBatchKMeans::new(3, 3, Some(42));
        let report = kmeans.train(&training_data(), 10).unwrap();

        assert!(report.epochs_run >= 1 && report.epochs_run <= 10);
        assert_eq!(report.batch_size, 1);
        assert_eq!(kmeans.units().len(), 3);
    }

    #[test]
    fn test_train_invalid_input() {
        let mut kmeans = MiniBatchKMeans::new(3, 3, Some(42));

        assert!(matches!(
            kmeans.train(&[], 10),
            Err(QuantError::InvalidTrainingData(_))
        ));
        assert!(matches!(
            kmeans.train(&[vec![0.1, 0.1, 0.1]], 10),
            Err(QuantError::InvalidTrainingData(_))
        ));
        assert!(matches!(
            kmeans.train(&[vec![0.1], vec![0.2], vec![0.3]], 10),
            Err(QuantError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_units_exist_before_training() {
        let kmeans = MiniBatchKMeans::new(4, 3, Some(1));
        assert_eq!(kmeans.k(), 4);
        assert_eq!(kmeans.unit_count(), 4);
        for unit in kmeans.units() {
            assert_eq!(kmeans.unit_coordinates(unit).unwrap(), &[0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_centroids_seeded_from_rows() {
        let data = training_data();
        let mut kmeans = MiniBatchKMeans::new(3, 3, Some(5));
        let report = kmeans.train(&data, 0).unwrap();

        assert_eq!(report.epochs_run, 0);
        for unit in kmeans.units() {
            let coords = kmeans.unit_coordinates(unit).unwrap();
            assert!(data.iter().any(|row| row.as_slice() == coords));
        }
    }

    #[test]
    fn test_converges_early() {
        let data: Vec<Vec<f64>> = (0..50).map(|_| vec![0.2, 0.4, 0.6]).collect();
        let mut kmeans = MiniBatchKMeans::new(1, 3, Some(11));
        let report = kmeans.train(&data, 100).unwrap();

        // Seeded on the only color, so the first epoch does not move it
        assert!(report.converged);
        assert_eq!(report.epochs_run, 1);
        assert_eq!(report.learning_rates, vec![0.5]);
    }

    #[test]
    fn test_update_centroids_skips_empty_clusters() {
        let mut kmeans = MiniBatchKMeans::new(2, 2, Some(3));
        let units = kmeans.units();
        kmeans.update_unit_coordinates(units[0], &[0.0, 0.0]).unwrap();
        kmeans.update_unit_coordinates(units[1], &[1.0, 1.0]).unwrap();

        let a = vec![0.2, 0.0];
        let b = vec![0.0, 0.2];
        let mini_batch = vec![&a, &b];
        kmeans.assign(&mini_batch).unwrap();
        let converged = kmeans.update_centroids(&mini_batch, 0.5).unwrap();

        assert!(!converged);
        let first = kmeans.unit_coordinates(units[0]).unwrap();
        assert!((first[0] - 0.05).abs() < 1e-12);
        assert!((first[1] - 0.05).abs() < 1e-12);
        assert_eq!(kmeans.unit_coordinates(units[1]).unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_find_closest_unit() {
        let kmeans = trained();
        let closest = kmeans.find_closest_unit(&[0.3, 0.3, 0.3]).unwrap();
        assert_eq!(closest.kind(), UnitKind::Centroid);
        assert!(kmeans.units().contains(&closest));
    }

    #[test]
    fn test_units_deep_copy() {
        let mut kmeans = trained();
        let copy = kmeans.units_deep_copy();
        let first = kmeans.units()[0];

        assert_eq!(copy.len(), 3);
        assert_eq!(copy[0].coordinates(), kmeans.unit_coordinates(first).unwrap());

        kmeans.update_unit_coordinates(first, &[0.01, 0.02, 0.03]).unwrap();
        assert_ne!(copy[0].coordinates(), &[0.01, 0.02, 0.03]);
    }

    #[test]
    fn test_set_units_restores_snapshot() {
        let mut kmeans = trained();
        let snapshot = kmeans.units_deep_copy();
        let first = kmeans.units()[0];

        kmeans.update_unit_coordinates(first, &[0.0, 0.0, 0.0]).unwrap();
        kmeans.set_units(&snapshot).unwrap();
        assert_eq!(kmeans.units_deep_copy(), snapshot);
    }

    #[test]
    fn test_set_units_invalid_input() {
        let mut kmeans = trained();

        let two: Vec<Unit> = kmeans.units_deep_copy().into_iter().take(2).collect();
        assert!(matches!(
            kmeans.set_units(&two),
            Err(QuantError::CardinalityMismatch {
                expected: 3,
                actual: 2
            })
        ));

        let nodes: Vec<Unit> = (0..3)
            .map(|i| Unit::from(GridNode::with_weights(i, 0, vec![0.5, 0.5, 0.5])))
            .collect();
        assert!(matches!(
            kmeans.set_units(&nodes),
            Err(QuantError::InvalidUnitType { .. })
        ));
    }

    #[test]
    fn test_update_unit_coordinates() {
        let mut kmeans = trained();
        let unit = kmeans.units()[0];

        kmeans.update_unit_coordinates(unit, &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(kmeans.unit_coordinates(unit).unwrap(), &[0.5, 0.5, 0.5]);
        assert_eq!(kmeans.centroid(unit).unwrap().coordinates(), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_update_invalid_unit() {
        let mut kmeans = trained();

        let twin = trained();
        assert!(matches!(
            kmeans.update_unit_coordinates(twin.units()[0], &[0.5, 0.5, 0.5]),
            Err(QuantError::ForeignUnit(_))
        ));

        let som = Som::new(3, 2, 2, Some(1));
        assert!(matches!(
            kmeans.update_unit_coordinates(som.units()[0], &[0.5, 0.5, 0.5]),
            Err(QuantError::InvalidUnitType { .. })
        ));
    }
}
