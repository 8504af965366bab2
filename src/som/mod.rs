//! Self-Organizing Map quantizer.
//!
//! A 2-D grid of nodes trained with mini-batches. Each input pulls its
//! best-matching node and that node's grid neighbors towards it, with a
//! Gaussian neighborhood kernel and linearly decaying learning rate and
//! radius.

mod map;
mod node;

pub use map::{Som, RADIUS_CLAMP_FRACTION, SOM_INITIAL_LEARNING_RATE};
pub use node::GridNode;
