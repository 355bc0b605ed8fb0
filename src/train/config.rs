//! Training run configuration

use crate::error::{Error, Result};
use crate::model::Device;
use std::path::PathBuf;

/// Configuration for a training run
///
/// The run name keys the checkpoint files under `output_root`, so two runs
/// with the same name resume each other.
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Run identifier; names the checkpoint directory and files
    pub run_name: String,

    /// Directory under which `<run_name>/` is created
    pub output_root: PathBuf,

    /// Total number of epochs to train
    pub epochs: usize,

    /// Number of semantic classes
    pub num_classes: usize,

    /// Early-stopping patience in epochs (None = disabled)
    ///
    /// Training stops once the current epoch is more than `patience` epochs
    /// past the best one.
    pub early_stop: Option<usize>,

    /// Print training progress every N steps (0 = epoch summaries only)
    pub log_interval: usize,

    /// Compute target the model is moved to before the loop
    pub device: Device,
}

impl TrainConfig {
    /// Create a configuration with defaults for the optional fields
    pub fn new(run_name: impl Into<String>, epochs: usize, num_classes: usize) -> Self {
        Self {
            run_name: run_name.into(),
            output_root: PathBuf::from("."),
            epochs,
            num_classes,
            early_stop: None,
            log_interval: 0,
            device: Device::Cpu,
        }
    }

    /// Set the output root directory
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Enable early stopping with the given patience
    pub fn with_early_stop(mut self, patience: usize) -> Self {
        self.early_stop = Some(patience);
        self
    }

    /// Set the step logging interval
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    /// Set the compute target
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Check the configuration before any training work starts
    pub fn validate(&self) -> Result<()> {
        if self.run_name.is_empty() {
            return Err(Error::ConfigError(
                "run name must not be empty".to_string(),
            ));
        }
        if self.num_classes == 0 {
            return Err(Error::ConfigError(
                "number of classes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TrainConfig::new("unet-potsdam", 50, 6)
            .with_output_root("/tmp/runs")
            .with_early_stop(5)
            .with_log_interval(10);

        assert_eq!(config.run_name, "unet-potsdam");
        assert_eq!(config.epochs, 50);
        assert_eq!(config.early_stop, Some(5));
        assert_eq!(config.output_root, PathBuf::from("/tmp/runs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_run_name_rejected() {
        let config = TrainConfig::new("", 10, 6);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_classes_rejected() {
        let config = TrainConfig::new("run", 10, 0);
        assert!(config.validate().is_err());
    }
}
