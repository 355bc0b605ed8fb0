//! Confusion-matrix accumulation and derived metrics

use crate::error::{Error, Result};
use crate::metrics::StreamingMetric;
use ndarray::{Array2, Array3, Array4};
use serde::{Deserialize, Serialize};

/// Immutable result of a metric computation
///
/// Per-class entries are `None` for classes absent from both ground truth
/// and prediction (zero denominator). Those classes are excluded from the
/// means rather than counted as zero, so rare absent classes do not drag
/// the score down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Correctly-classified fraction over all valid pixels
    pub accuracy: f64,
    /// Per-class intersection over union
    pub class_iou: Vec<Option<f64>>,
    /// Mean IoU over classes with a defined value
    pub mean_iou: f64,
    /// Per-class F1 (Dice) score
    pub class_f1: Vec<Option<f64>>,
    /// Mean F1 over classes with a defined value
    pub mean_f1: f64,
    /// The raw confusion matrix the snapshot was derived from
    pub matrix: Array2<u64>,
}

/// Streaming confusion-matrix metric
///
/// Accumulates a `num_classes × num_classes` matrix of per-pixel
/// (true class, predicted class) counts across batches. Accumulation is
/// purely additive, so updating batch-by-batch is exactly equivalent to
/// building the matrix from the concatenation of all batches.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    num_classes: usize,
    matrix: Array2<u64>,
}

impl ConfusionMatrix {
    /// Create a zeroed matrix for `num_classes` classes
    pub fn new(num_classes: usize) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::ConfigError(
                "confusion matrix requires at least one class".to_string(),
            ));
        }
        Ok(Self {
            num_classes,
            matrix: Array2::zeros((num_classes, num_classes)),
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// The accumulated matrix, indexed `[true_class, predicted_class]`
    pub fn matrix(&self) -> &Array2<u64> {
        &self.matrix
    }

    /// Fold one batch into the running matrix
    ///
    /// `predictions` are per-pixel class scores (`batch × classes × h × w`);
    /// the predicted class is the argmax along the class axis, first maximum
    /// winning on ties. `targets` are per-pixel labels (`batch × h × w`);
    /// pixels whose label falls outside `[0, num_classes)` are masked out.
    pub fn update(&mut self, predictions: &Array4<f32>, targets: &Array3<i64>) {
        let (b, c, h, w) = predictions.dim();
        assert_eq!(
            c, self.num_classes,
            "prediction class axis does not match metric class count"
        );
        assert_eq!(
            (b, h, w),
            targets.dim(),
            "predictions and targets must match in batch size and spatial shape"
        );

        for bi in 0..b {
            for hi in 0..h {
                for wi in 0..w {
                    let truth = targets[[bi, hi, wi]];
                    if truth < 0 || truth >= self.num_classes as i64 {
                        continue;
                    }
                    let mut predicted = 0;
                    let mut best = predictions[[bi, 0, hi, wi]];
                    for ci in 1..c {
                        let score = predictions[[bi, ci, hi, wi]];
                        if score > best {
                            best = score;
                            predicted = ci;
                        }
                    }
                    self.matrix[[truth as usize, predicted]] += 1;
                }
            }
        }
    }

    /// Snapshot the metrics derived from the accumulated matrix
    pub fn compute(&self) -> MetricSnapshot {
        Self::compute_from(&self.matrix)
    }

    /// Compute metrics from an externally supplied matrix
    ///
    /// Used for post-hoc recomputation, e.g. over a matrix restored from a
    /// checkpoint. The matrix must be square.
    pub fn compute_from(matrix: &Array2<u64>) -> MetricSnapshot {
        let (rows, cols) = matrix.dim();
        assert_eq!(rows, cols, "confusion matrix must be square");

        let total: u64 = matrix.iter().sum();
        let trace: u64 = (0..rows).map(|i| matrix[[i, i]]).sum();
        let accuracy = if total == 0 {
            0.0
        } else {
            trace as f64 / total as f64
        };

        let mut class_iou = Vec::with_capacity(rows);
        let mut class_f1 = Vec::with_capacity(rows);
        for c in 0..rows {
            let row: u64 = matrix.row(c).iter().sum();
            let col: u64 = matrix.column(c).iter().sum();
            let tp = matrix[[c, c]];
            // row + col counts the diagonal twice; IoU removes one copy
            let union = row + col - tp;
            class_iou.push(if union == 0 {
                None
            } else {
                Some(tp as f64 / union as f64)
            });
            class_f1.push(if row + col == 0 {
                None
            } else {
                Some(2.0 * tp as f64 / (row + col) as f64)
            });
        }

        MetricSnapshot {
            accuracy,
            mean_iou: mean_defined(&class_iou),
            mean_f1: mean_defined(&class_f1),
            class_iou,
            class_f1,
            matrix: matrix.clone(),
        }
    }

    /// Zero the accumulated matrix, keeping the class count
    pub fn reset(&mut self) {
        self.matrix.fill(0);
    }
}

fn mean_defined(values: &[Option<f64>]) -> f64 {
    let defined: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if defined.is_empty() {
        0.0
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    }
}

impl StreamingMetric for ConfusionMatrix {
    fn new(num_classes: usize) -> Result<Self> {
        ConfusionMatrix::new(num_classes)
    }

    fn update(&mut self, predictions: &Array4<f32>, targets: &Array3<i64>) {
        ConfusionMatrix::update(self, predictions, targets)
    }

    fn compute(&self) -> MetricSnapshot {
        ConfusionMatrix::compute(self)
    }

    fn reset(&mut self) {
        ConfusionMatrix::reset(self)
    }
}
