//! Contracts for the external collaborators driven by the training loop
//!
//! The model, optimizer, learning-rate scheduler and loss function are
//! opaque to this crate: the loop only needs the calls below. Persistence
//! goes through [`StateDict`] — extracted named buffers, never live
//! objects — so the checkpoint format stays decoupled from any concrete
//! implementation.

use crate::Result;
use ndarray::{Array3, Array4};
use std::collections::BTreeMap;

/// Named parameter buffers, flattened to `f32`.
///
/// A `BTreeMap` keeps serialization order stable across runs.
pub type StateDict = BTreeMap<String, Vec<f32>>;

/// Compute target for model placement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA device by ordinal
    Cuda(usize),
}

/// Trait for segmentation models
///
/// `forward` maps a `batch × channels × height × width` input to
/// `batch × num_classes × height × width` per-pixel class scores.
pub trait Model {
    /// Run the forward pass
    fn forward(&mut self, inputs: &Array4<f32>) -> Array4<f32>;

    /// Accumulate parameter gradients from `dL/d(predictions)`
    ///
    /// Only called during training; gradients must accumulate until the
    /// optimizer's `zero_grad`.
    fn backward(&mut self, grad_output: &Array4<f32>);

    /// Switch between training and inference behavior
    fn set_training(&mut self, training: bool);

    /// Move parameters to a compute target
    fn to_device(&mut self, _device: Device) {}

    /// Extract the learnable parameters
    fn state_dict(&self) -> StateDict;

    /// Restore the learnable parameters
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()>;
}

/// Trait for optimizers
///
/// The optimizer is wired to the model's parameters by whoever constructs
/// it; the loop only asks it to step and to clear gradients.
pub trait Optimizer {
    /// Apply pending gradients to the parameters
    fn step(&mut self);

    /// Zero out all accumulated gradients
    fn zero_grad(&mut self);

    /// Extract internal state (momentum buffers etc.)
    fn state_dict(&self) -> StateDict;

    /// Restore internal state
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()>;
}

/// Trait for learning-rate schedulers
///
/// When a scheduler is configured the loop advances it once per training
/// batch, not once per epoch.
pub trait LrScheduler {
    /// Advance the schedule by one step
    fn step(&mut self);

    /// Extract internal state (step counters etc.)
    fn state_dict(&self) -> StateDict;

    /// Restore internal state
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()>;
}

/// Trait for loss functions
pub trait LossFn {
    /// Compute the scalar loss for a batch
    fn forward(&self, predictions: &Array4<f32>, targets: &Array3<i64>) -> f64;

    /// Compute `dL/d(predictions)` for the backward pass
    fn backward(&self, predictions: &Array4<f32>, targets: &Array3<i64>) -> Array4<f32>;

    /// Name of the loss function
    fn name(&self) -> &str {
        "LossFn"
    }
}
