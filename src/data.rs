//! Batch contract for dataset iterators
//!
//! Batch production (file reading, decoding, augmentation, shuffling) is an
//! external collaborator. The loop only requires something that can hand out
//! `(inputs, targets)` batches once per epoch and report its length in
//! batches.

use ndarray::{Array3, Array4};

/// One batch of inputs and per-pixel integer class labels
///
/// Inputs are `batch × channels × height × width`; targets are
/// `batch × height × width`. Targets use `i64` so out-of-range labels from
/// upstream decoding survive until the metric masks them out.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Array4<f32>,
    pub targets: Array3<i64>,
}

impl Batch {
    /// Create a batch, checking that inputs and targets agree spatially
    pub fn new(inputs: Array4<f32>, targets: Array3<i64>) -> Self {
        let (b, _, h, w) = inputs.dim();
        assert_eq!(
            (b, h, w),
            targets.dim(),
            "Batch inputs and targets must match in batch size and spatial shape"
        );
        Self { inputs, targets }
    }

    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.inputs.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for re-iterable batch sources
///
/// `batches` may be called once per epoch; validation loaders are expected
/// to yield a stable order, training loaders may shuffle.
pub trait BatchLoader {
    /// Length in batches (not samples)
    fn num_batches(&self) -> usize;

    /// Iterate over the batches of one full pass
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_>;

    fn is_empty(&self) -> bool {
        self.num_batches() == 0
    }
}

/// In-memory dataset: a plain vector of pre-built batches
impl BatchLoader for Vec<Batch> {
    fn num_batches(&self) -> usize {
        self.len()
    }

    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};

    fn batch(samples: usize) -> Batch {
        Batch::new(
            Array4::zeros((samples, 3, 2, 2)),
            Array3::zeros((samples, 2, 2)),
        )
    }

    #[test]
    fn test_batch_len() {
        assert_eq!(batch(4).len(), 4);
        assert!(!batch(4).is_empty());
    }

    #[test]
    #[should_panic(expected = "must match in batch size and spatial shape")]
    fn test_batch_shape_mismatch() {
        Batch::new(Array4::zeros((2, 3, 4, 4)), Array3::zeros((2, 4, 5)));
    }

    #[test]
    fn test_vec_loader_reiterates() {
        let loader = vec![batch(2), batch(3)];
        assert_eq!(loader.num_batches(), 2);

        // Two full passes yield the same batch sizes
        for _ in 0..2 {
            let sizes: Vec<usize> = loader.batches().map(|b| b.len()).collect();
            assert_eq!(sizes, vec![2, 3]);
        }
    }

    #[test]
    fn test_empty_loader() {
        let loader: Vec<Batch> = Vec::new();
        assert!(BatchLoader::is_empty(&loader));
        assert_eq!(loader.batches().count(), 0);
    }
}
