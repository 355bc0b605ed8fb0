//! High-level training loop
//!
//! This module provides the training supervisor and its persistence layer:
//! - Training configuration
//! - Per-epoch records
//! - "last"/"best" checkpointing with resume
//! - The epoch loop with validation and early stopping

mod checkpoint;
mod config;
mod record;
mod trainer;

pub use checkpoint::{checkpoint_path, Checkpoint, Variant};
pub use config::TrainConfig;
pub use record::EpochRecord;
pub use trainer::{TrainReport, Trainer};
