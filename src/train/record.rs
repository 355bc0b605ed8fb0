//! Per-epoch training records

use crate::metrics::MetricSnapshot;
use serde::{Deserialize, Serialize};

/// Result of one completed epoch
///
/// Records are append-only and ordered by epoch index; the full sequence is
/// persisted inside every checkpoint so a resumed run keeps its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch index, 0-based
    pub epoch: usize,

    /// Mean training loss (per batch)
    pub train_loss: f64,

    /// Mean validation loss (per batch)
    pub val_loss: f64,

    /// Validation metrics for this epoch
    pub metrics: MetricSnapshot,

    /// Wall-clock seconds spent in the training phase, excluding validation
    pub train_secs: f64,
}
