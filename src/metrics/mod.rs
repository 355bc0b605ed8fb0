//! Confusion-matrix metrics for semantic segmentation
//!
//! [`ConfusionMatrix`] accumulates per-pixel (true class, predicted class)
//! counts across batches; [`MetricSnapshot`] carries the derived accuracy,
//! IoU and F1 values. [`StreamingMetric`] is the seam the evaluator uses so
//! other streaming metric engines can be plugged in.

mod confusion;

pub use confusion::{ConfusionMatrix, MetricSnapshot};

use crate::Result;
use ndarray::{Array3, Array4};

/// Trait for metric engines that accumulate per-batch statistics
pub trait StreamingMetric {
    /// Create a fresh engine for `num_classes` classes
    fn new(num_classes: usize) -> Result<Self>
    where
        Self: Sized;

    /// Fold one batch of predictions and ground-truth labels into the
    /// running statistics
    fn update(&mut self, predictions: &Array4<f32>, targets: &Array3<i64>);

    /// Snapshot the metric derived from everything accumulated so far
    fn compute(&self) -> MetricSnapshot;

    /// Clear accumulated statistics, keeping the class count
    fn reset(&mut self);
}
