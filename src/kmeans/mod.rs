//! Mini-Batch K-Means quantizer.

mod centroid;
mod mini_batch;

pub use centroid::Centroid;
pub use mini_batch::{MiniBatchKMeans, CONVERGENCE_THRESHOLD, KMEANS_INITIAL_LEARNING_RATE};
