//! Node representation for the Self-Organizing Map.

use crate::error::{QuantError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A node in the Self-Organizing Map.
///
/// Each node has a fixed position on the 2D grid and a weight vector that
/// represents the color it has learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridNode {
    x: usize,
    y: usize,
    weights: Vec<f64>,
}

impl GridNode {
    /// Creates a new node with weights drawn uniformly from `[0, 1)`.
    pub fn new_random<R: Rng + ?Sized>(x: usize, y: usize, weight_dim: usize, rng: &mut R) -> Self {
        let weights: Vec<f64> = (0..weight_dim).map(|_| rng.gen::<f64>()).collect();

        Self { x, y, weights }
    }

    /// Creates a new node with the given weights.
    pub fn with_weights(x: usize, y: usize, weights: Vec<f64>) -> Self {
        Self { x, y, weights }
    }

    /// Column position on the grid.
    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    /// Row position on the grid.
    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Grid position as a vector, for neighborhood distances.
    #[inline]
    pub fn position(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }

    /// The node's weight vector.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Overwrites the weights. The length must not change.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.weights.len() {
            return Err(QuantError::dimension(self.weights.len(), weights.len()));
        }
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Moves the weights towards an input vector.
    ///
    /// `learning_rate` is the overall learning rate.
    /// `influence` is the neighborhood influence (0.0 to 1.0).
    pub fn update_weights(&mut self, input: &[f64], learning_rate: f64, influence: f64) {
        debug_assert_eq!(
            self.weights.len(),
            input.len(),
            "Weight and input dimensions must match"
        );

        let step = learning_rate * influence;
        for (w, i) in self.weights.iter_mut().zip(input.iter()) {
            *w += step * (i - *w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_node_creation() {
        let node = GridNode::with_weights(5, 10, vec![0.0; 3]);
        assert_eq!(node.x(), 5);
        assert_eq!(node.y(), 10);
        assert_eq!(node.position(), [5.0, 10.0]);
        assert_eq!(node.weights().len(), 3);
    }

    #[test]
    fn test_random_initialization_in_unit_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let node = GridNode::new_random(0, 0, 100, &mut rng);
        assert_eq!(node.weights().len(), 100);
        assert!(node.weights().iter().all(|&w| (0.0..1.0).contains(&w)));
        assert!(node.weights().iter().any(|&w| w != node.weights()[0]));
    }

    #[test]
    fn test_update_weights() {
        let mut node = GridNode::with_weights(0, 0, vec![0.0, 0.0, 0.0]);
        node.update_weights(&[1.0, 1.0, 1.0], 0.5, 1.0);
        assert!((node.weights()[0] - 0.5).abs() < 1e-10);

        node.update_weights(&[1.0, 1.0, 1.0], 0.5, 0.5);
        assert!((node.weights()[1] - 0.625).abs() < 1e-10);
    }

    #[test]
    fn test_set_weights_rejects_new_length() {
        let mut node = GridNode::with_weights(1, 1, vec![0.2, 0.2, 0.2]);
        assert!(node.set_weights(&[0.5, 0.5]).is_err());
        assert_eq!(node.weights(), &[0.2, 0.2, 0.2]);

        node.set_weights(&[0.5, 0.6, 0.7]).unwrap();
        assert_eq!(node.weights(), &[0.5, 0.6, 0.7]);
    }
}
