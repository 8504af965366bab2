//! Mini-batch sampling.
//!
//! Both quantizers train on a fresh random sample of the training set each
//! epoch rather than on the full set.

use rand::Rng;

/// Fraction of the training set drawn per epoch.
pub const BATCH_FRACTION: f64 = 0.02;

/// Upper bound on the mini-batch size.
pub const MAX_BATCH_SIZE: usize = 1024;

/// Returns the mini-batch size for a training set of `len` rows.
///
/// `max(1, min(round(0.02 * len), 1024))`
pub fn batch_size_for(len: usize) -> usize {
    let scaled = (len as f64 * BATCH_FRACTION).round() as usize;
    scaled.min(MAX_BATCH_SIZE).max(1)
}

/// Draws `batch_size` rows from `data` uniformly at random, with replacement.
///
/// The result is in draw order, so duplicates are possible. An empty `data`
/// yields an empty batch.
pub fn sample<'a, T, R>(data: &'a [T], batch_size: usize, rng: &mut R) -> Vec<&'a T>
where
    R: Rng + ?Sized,
{
    if data.is_empty() {
        return Vec::new();
    }

    (0..batch_size)
        .map(|_| &data[rng.gen_range(0..data.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_data() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 1.0, 1.0],
            vec![0.5, 0.5, 0.5],
            vec![0.8, 0.8, 0.8],
            vec![0.3, 0.3, 0.3],
        ]
    }

    #[test]
    fn test_batch_size_policy() {
        assert_eq!(batch_size_for(0), 1);
        assert_eq!(batch_size_for(3), 1);
        assert_eq!(batch_size_for(100), 2);
        // 0.02 * 125 = 2.5 rounds away from zero
        assert_eq!(batch_size_for(125), 3);
        assert_eq!(batch_size_for(10_000), 200);
        assert_eq!(batch_size_for(1_000_000), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_sample_size() {
        let data = test_data();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let batch = sample(&data, 2, &mut rng);
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|row| row.len() == data[0].len()));
    }

    #[test]
    fn test_sample_with_replacement() {
        let data = test_data();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // More draws than rows forces duplicates
        let batch = sample(&data, 64, &mut rng);
        assert_eq!(batch.len(), 64);
        assert!(batch.iter().all(|row| data.contains(row)));
    }

    #[test]
    fn test_sample_deterministic_with_seed() {
        let data = test_data();
        let a = sample(&data, 16, &mut ChaCha8Rng::seed_from_u64(3));
        let b = sample(&data, 16, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_empty() {
        let data: Vec<Vec<f64>> = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(sample(&data, 5, &mut rng).is_empty());
    }
}
