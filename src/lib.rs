//! # Segmentar: Segmentation Training & Evaluation Library
//!
//! Segmentar drives training and evaluation of semantic-segmentation models
//! over tiled aerial/satellite imagery: a resumable epoch loop with
//! "last"/"best" checkpointing and early stopping, plus a confusion-matrix
//! metric engine (accuracy, mean IoU, per-class IoU, F1).
//!
//! The model, optimizer, scheduler and loss function are external
//! collaborators behind traits; so is batch production. The crate owns the
//! control logic only.
//!
//! ## Architecture
//!
//! - **metrics**: Streaming confusion-matrix metric and snapshots
//! - **eval**: Full-dataset evaluation pass with updates disabled
//! - **train**: Supervisor, epoch records, checkpoint persistence
//! - **model**: Contracts for model/optimizer/scheduler/loss collaborators
//! - **data**: Batch and loader contracts
//! - **norm**: Per-dataset image normalization parameters

pub mod data;
pub mod eval;
pub mod metrics;
pub mod model;
pub mod norm;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use data::{Batch, BatchLoader};
pub use error::{Error, Result};
pub use eval::evaluate;
pub use metrics::{ConfusionMatrix, MetricSnapshot, StreamingMetric};
pub use model::{Device, LossFn, LrScheduler, Model, Optimizer, StateDict};
pub use norm::{NormStats, Normalization};
pub use train::{Checkpoint, EpochRecord, TrainConfig, TrainReport, Trainer};
