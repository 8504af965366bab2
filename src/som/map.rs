//! Self-Organizing Map (SOM) implementation.

use crate::batch;
use crate::decay::{Decay, LinearDecay};
use crate::distance::{Distance, Euclidean};
use crate::error::Result;
use crate::quantizer::{closest_index, validate_training_data, Quantizer, TrainingReport};
use crate::som::GridNode;
use crate::unit::{Ownership, Unit, UnitId, UnitKind};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Initial learning rate of every SOM.
pub const SOM_INITIAL_LEARNING_RATE: f64 = 0.5;

/// Fraction of the epochs during which the radius is clamped to at least 1.
pub const RADIUS_CLAMP_FRACTION: f64 = 0.8;

/// A Self-Organizing Map used as a color quantizer.
///
/// The SOM is a `map_width x map_height` grid of nodes. Training pulls the
/// best-matching node and its grid neighbors towards each input, so nearby
/// nodes end up holding similar colors.
///
/// Nodes are enumerated with `x` in the outer loop and `y` in the inner
/// loop: the node at `(x, y)` has index `x * map_height + y`.
#[derive(Debug)]
pub struct Som<D = Euclidean, Y = LinearDecay> {
    map_width: usize,
    map_height: usize,
    input_dimension: usize,
    nodes: Vec<GridNode>,
    initial_learning_rate: f64,
    initial_radius: f64,
    distance: D,
    decay: Y,
    rng: ChaCha8Rng,
    ownership: Ownership,
}

impl Som {
    /// Creates a new SOM with Euclidean distance and linear decay.
    ///
    /// With `seed: None` the random source is seeded from the OS.
    pub fn new(input_dimension: usize, map_width: usize, map_height: usize, seed: Option<u64>) -> Self {
        Self::with_strategies(
            input_dimension,
            map_width,
            map_height,
            Euclidean,
            LinearDecay,
            seed,
        )
    }
}

impl<D: Distance, Y: Decay> Som<D, Y> {
    /// Creates a new SOM with custom distance and decay strategies.
    pub fn with_strategies(
        input_dimension: usize,
        map_width: usize,
        map_height: usize,
        distance: D,
        decay: Y,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(input_dimension, map_width, map_height, distance, decay, rng)
    }

    /// Creates a new SOM drawing all randomness from `rng`.
    pub fn with_rng(
        input_dimension: usize,
        map_width: usize,
        map_height: usize,
        distance: D,
        decay: Y,
        mut rng: ChaCha8Rng,
    ) -> Self {
        let total = map_width * map_height;
        let nodes: Vec<GridNode> = (0..total)
            .map(|i| {
                let x = i / map_height;
                let y = i % map_height;
                GridNode::new_random(x, y, input_dimension, &mut rng)
            })
            .collect();

        Self {
            map_width,
            map_height,
            input_dimension,
            nodes,
            initial_learning_rate: SOM_INITIAL_LEARNING_RATE,
            initial_radius: map_width.max(map_height) as f64 / 2.0,
            distance,
            decay,
            rng,
            ownership: Ownership::new(UnitKind::GridNode, total, "SOM"),
        }
    }

    /// Width of the grid.
    #[inline]
    pub fn map_width(&self) -> usize {
        self.map_width
    }

    /// Height of the grid.
    #[inline]
    pub fn map_height(&self) -> usize {
        self.map_height
    }

    /// Neighborhood radius at the start of training.
    #[inline]
    pub fn initial_radius(&self) -> f64 {
        self.initial_radius
    }

    /// Gets an owned node through its handle.
    pub fn node(&self, unit: UnitId) -> Result<&GridNode> {
        let index = self.ownership.resolve(unit)?;
        Ok(&self.nodes[index])
    }

    /// Gets a node by its grid position.
    #[inline]
    pub fn node_at(&self, x: usize, y: usize) -> Option<&GridNode> {
        if x < self.map_width && y < self.map_height {
            Some(&self.nodes[self.coords_to_index(x, y)])
        } else {
            None
        }
    }

    /// Converts a grid position to an enumeration index.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> usize {
        x * self.map_height + y
    }

    /// Converts an enumeration index to a grid position.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> (usize, usize) {
        (index / self.map_height, index % self.map_height)
    }

    /// Index of the Best Matching Unit (BMU) for an input vector.
    fn find_bmu(&self, input: &[f64]) -> Result<usize> {
        closest_index(
            &self.distance,
            input,
            self.nodes.iter().map(|n| n.weights()),
        )
    }

    /// Pulls every node within `radius` of the BMU towards `input`.
    ///
    /// Grid distance uses the same distance strategy as the color space,
    /// applied to `(x, y)` positions. Influence follows a Gaussian kernel.
    fn update_neighborhood(
        &mut self,
        input: &[f64],
        bmu_idx: usize,
        learning_rate: f64,
        radius: f64,
    ) -> Result<()> {
        let bmu_pos = self.nodes[bmu_idx].position();
        let sigma_sq = radius * radius;

        for node in self.nodes.iter_mut() {
            let grid_dist = self.distance.compute(&bmu_pos, &node.position())?;
            if grid_dist <= radius {
                let influence = if sigma_sq > 0.0 {
                    (-grid_dist * grid_dist / (2.0 * sigma_sq)).exp()
                } else {
                    1.0
                };
                node.update_weights(input, learning_rate, influence);
            }
        }
        Ok(())
    }

    /// Radius for the epoch following `epoch`.
    ///
    /// Clamped to at least 1 for the first 80% of epochs so that neighbors
    /// keep moving with the BMU; afterwards it may shrink below 1 and only
    /// the BMU is updated.
    fn next_radius(&self, epoch: usize, epochs: usize) -> Result<f64> {
        let decayed = self.decay.compute(self.initial_radius, epoch, epochs)?;
        if (epoch as f64) < RADIUS_CLAMP_FRACTION * epochs as f64 {
            Ok(decayed.max(1.0))
        } else {
            Ok(decayed)
        }
    }
}

impl<D: Distance, Y: Decay> Quantizer for Som<D, Y> {
    fn kind(&self) -> UnitKind {
        UnitKind::GridNode
    }

    fn unit_count(&self) -> usize {
        self.ownership.len()
    }

    fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    fn train(&mut self, data: &[Vec<f64>], epochs: usize) -> Result<TrainingReport> {
        validate_training_data(data, self.unit_count(), self.input_dimension)?;

        let batch_size = batch::batch_size_for(data.len());
        let mut learning_rate = self.initial_learning_rate;
        let mut radius = self.initial_radius;
        let mut report = TrainingReport {
            batch_size,
            ..Default::default()
        };

        info!(
            "Training SOM: {} samples, {}x{} nodes, {} epochs, batch size {}",
            data.len(),
            self.map_width,
            self.map_height,
            epochs,
            batch_size
        );
        let log_every = (epochs / 10).max(1);

        for epoch in 0..epochs {
            if epoch % log_every == 0 || epoch + 1 == epochs {
                info!(
                    "Epoch {}/{}: lr={:.4}, radius={:.3}",
                    epoch + 1,
                    epochs,
                    learning_rate,
                    radius
                );
            } else {
                debug!(
                    "Epoch {}/{}: lr={:.4}, radius={:.3}",
                    epoch + 1,
                    epochs,
                    learning_rate,
                    radius
                );
            }
            report.learning_rates.push(learning_rate);
            report.radii.push(radius);

            let mini_batch = batch::sample(data, batch_size, &mut self.rng);
            for input in mini_batch {
                let bmu_idx = self.find_bmu(input)?;
                self.update_neighborhood(input, bmu_idx, learning_rate, radius)?;
            }

            learning_rate = self.decay.compute(self.initial_learning_rate, epoch, epochs)?;
            radius = self.next_radius(epoch, epochs)?;
            report.epochs_run = epoch + 1;
        }

        info!("SOM training completed after {} epochs", report.epochs_run);
        Ok(report)
    }

    fn find_closest_unit(&self, input: &[f64]) -> Result<UnitId> {
        let index = self.find_bmu(input)?;
        Ok(self.ownership.handle(index))
    }

    fn unit_coordinates(&self, unit: UnitId) -> Result<&[f64]> {
        Ok(self.node(unit)?.weights())
    }

    fn update_unit_coordinates(&mut self, unit: UnitId, coordinates: &[f64]) -> Result<()> {
        let index = self.ownership.resolve(unit)?;
        self.nodes[index].set_weights(coordinates)
    }

    fn units(&self) -> Vec<UnitId> {
        self.ownership.handles()
    }

    fn set_units(&mut self, units: &[Unit]) -> Result<()> {
        self.ownership.check_replacement(units, self.input_dimension)?;
        for (node, unit) in self.nodes.iter_mut().zip(units) {
            node.set_weights(unit.coordinates())?;
        }
        Ok(())
    }

    fn units_deep_copy(&self) -> Vec<Unit> {
        self.nodes.iter().cloned().map(Unit::GridNode).collect()
    }
}
