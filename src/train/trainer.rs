//! Training supervisor
//!
//! Drives the epoch loop over opaque model/optimizer/loss collaborators,
//! validates after every epoch, persists "last" and "best" checkpoints, and
//! resumes interrupted runs from the "last" checkpoint.

use crate::data::BatchLoader;
use crate::error::{Error, Result};
use crate::eval::evaluate;
use crate::metrics::StreamingMetric;
use crate::model::{LossFn, LrScheduler, Model, Optimizer};
use crate::train::checkpoint::{checkpoint_path, Checkpoint, Variant};
use crate::train::{EpochRecord, TrainConfig};
use std::time::Instant;

/// Result of a training run
///
/// Early stopping is a normal termination mode, distinguishable from
/// exhausting the epoch budget via `stopped_early`.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Full epoch history, including epochs restored from a checkpoint
    pub records: Vec<EpochRecord>,
    /// Minimum validation loss across all recorded epochs
    pub min_val_loss: f64,
    /// Epoch with the minimum validation loss (later epoch wins ties)
    pub best_epoch: Option<usize>,
    /// Whether the run terminated via early stopping
    pub stopped_early: bool,
}

/// High-level supervisor that orchestrates the training loop
///
/// On `fit`, an existing "last" checkpoint for the configured run is loaded
/// and training continues from the epoch after it; otherwise the run starts
/// fresh. Every epoch ends with a "last" checkpoint write, and epochs whose
/// validation loss reaches the running minimum (ties included) also refresh
/// the "best" checkpoint.
pub struct Trainer {
    model: Box<dyn Model>,
    optimizer: Box<dyn Optimizer>,
    loss_fn: Box<dyn LossFn>,
    scheduler: Option<Box<dyn LrScheduler>>,
    config: TrainConfig,
    records: Vec<EpochRecord>,
    min_val_loss: f64,
    best_epoch: Option<usize>,
}

impl Trainer {
    /// Create a trainer, validating the configuration up front
    pub fn new(
        model: Box<dyn Model>,
        optimizer: Box<dyn Optimizer>,
        loss_fn: Box<dyn LossFn>,
        config: TrainConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            optimizer,
            loss_fn,
            scheduler: None,
            config,
            records: Vec::new(),
            min_val_loss: f64::INFINITY,
            best_epoch: None,
        })
    }

    /// Attach a learning-rate scheduler, advanced once per training batch
    pub fn with_scheduler(mut self, scheduler: Box<dyn LrScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Epoch history recorded so far
    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    fn build_checkpoint(&self, epoch: usize) -> Checkpoint {
        Checkpoint {
            model: self.model.state_dict(),
            optimizer: self.optimizer.state_dict(),
            scheduler: self.scheduler.as_ref().map(|s| s.state_dict()),
            min_val_loss: self.min_val_loss,
            records: self.records.clone(),
            epoch,
        }
    }

    /// Restore state from an existing "last" checkpoint
    ///
    /// Returns the epoch to continue from. The minimum validation loss and
    /// best epoch are rescanned from the restored records with an inclusive
    /// compare, so a restored tie picks the later epoch, matching live
    /// behavior.
    fn resume(&mut self, checkpoint: Checkpoint) -> Result<usize> {
        self.model.load_state_dict(&checkpoint.model)?;
        self.optimizer.load_state_dict(&checkpoint.optimizer)?;
        if let (Some(scheduler), Some(state)) = (&mut self.scheduler, &checkpoint.scheduler) {
            scheduler.load_state_dict(state)?;
        }
        self.records = checkpoint.records;

        for record in &self.records {
            if record.val_loss <= self.min_val_loss {
                self.min_val_loss = record.val_loss;
                self.best_epoch = Some(record.epoch);
            }
        }

        Ok(self.records.last().map_or(0, |r| r.epoch + 1))
    }

    fn report(&self, stopped_early: bool) -> TrainReport {
        TrainReport {
            records: self.records.clone(),
            min_val_loss: self.min_val_loss,
            best_epoch: self.best_epoch,
            stopped_early,
        }
    }

    /// Train and validate for the configured number of epochs
    ///
    /// `M` is the streaming metric engine used for validation. The returned
    /// report carries the full epoch history, including restored epochs.
    pub fn fit<M: StreamingMetric>(
        &mut self,
        train_loader: &dyn BatchLoader,
        valid_loader: &dyn BatchLoader,
    ) -> Result<TrainReport> {
        if train_loader.is_empty() || valid_loader.is_empty() {
            return Err(Error::ConfigError(
                "training and validation loaders must not be empty".to_string(),
            ));
        }

        self.records.clear();
        self.min_val_loss = f64::INFINITY;
        self.best_epoch = None;

        let last_path = checkpoint_path(&self.config.output_root, &self.config.run_name, Variant::Last);
        let best_path = checkpoint_path(&self.config.output_root, &self.config.run_name, Variant::Best);

        let mut start_epoch = 0;
        if last_path.exists() {
            // A failed read here is fatal: silently starting over would
            // corrupt the best-epoch accounting of the existing run.
            let checkpoint = Checkpoint::load(&last_path)?;
            start_epoch = self.resume(checkpoint)?;
            println!(
                "Resuming run '{}' from epoch {} (best epoch so far: {:?})",
                self.config.run_name, start_epoch, self.best_epoch
            );
            if start_epoch >= self.config.epochs {
                println!(
                    "Run '{}' already trained for {} epochs",
                    self.config.run_name, start_epoch
                );
                return Ok(self.report(false));
            }
        }

        self.model.to_device(self.config.device);

        let num_train_batches = train_loader.num_batches();
        let mut stopped_early = false;

        for epoch in start_epoch..self.config.epochs {
            let epoch_start = Instant::now();

            // Training phase
            self.model.set_training(true);
            let mut train_loss = 0.0;
            for (step, batch) in train_loader.batches().enumerate() {
                let predictions = self.model.forward(&batch.inputs);
                let loss = self.loss_fn.forward(&predictions, &batch.targets);
                train_loss += loss;

                let grad = self.loss_fn.backward(&predictions, &batch.targets);
                self.model.backward(&grad);
                self.optimizer.step();
                self.optimizer.zero_grad();
                if let Some(scheduler) = &mut self.scheduler {
                    scheduler.step();
                }

                if self.config.log_interval > 0 && (step + 1) % self.config.log_interval == 0 {
                    println!(
                        "Epoch {}, Step {}/{}: loss={:.4}",
                        epoch + 1,
                        step + 1,
                        num_train_batches,
                        train_loss / (step + 1) as f64
                    );
                }
            }
            let train_loss = train_loss / num_train_batches as f64;
            // Duration covers the training phase only, not validation
            let train_secs = epoch_start.elapsed().as_secs_f64();

            // Validation phase
            let (val_loss, snapshot) = evaluate::<M>(
                self.model.as_mut(),
                valid_loader,
                self.loss_fn.as_ref(),
                self.config.num_classes,
            )?;

            self.records.push(EpochRecord {
                epoch,
                train_loss,
                val_loss,
                metrics: snapshot,
                train_secs,
            });

            // A tie still counts as an improvement, so "best" is never older
            // than the most recent equally-good epoch
            let improved = val_loss <= self.min_val_loss;
            if improved {
                self.min_val_loss = val_loss;
                self.best_epoch = Some(epoch);
            }

            // "last" must land before the epoch counts as complete; a crash
            // right after leaves a consistent, resumable state
            let checkpoint = self.build_checkpoint(epoch);
            checkpoint.save(&last_path)?;

            println!(
                "Epoch {}/{}: train_loss: {:.4}, val_loss: {:.4}, mIoU: {:.4} ({:.1}s)",
                epoch + 1,
                self.config.epochs,
                train_loss,
                val_loss,
                self.records.last().map_or(0.0, |r| r.metrics.mean_iou),
                train_secs
            );

            if improved {
                checkpoint.save(&best_path)?;
                println!("Best model saved at epoch {} (val_loss {:.4})", epoch + 1, val_loss);
            } else if let (Some(patience), Some(best)) = (self.config.early_stop, self.best_epoch) {
                if epoch - best > patience {
                    eprintln!(
                        "Early stopping at epoch {}: no improvement for more than {} epochs",
                        epoch + 1,
                        patience
                    );
                    stopped_early = true;
                    break;
                }
            }
        }

        Ok(self.report(stopped_early))
    }
}
