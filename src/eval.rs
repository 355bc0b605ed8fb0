//! Full-dataset evaluation pass

use crate::data::BatchLoader;
use crate::error::{Error, Result};
use crate::metrics::{MetricSnapshot, StreamingMetric};
use crate::model::{LossFn, Model};

/// Evaluate a model over one full pass of a dataset
///
/// Runs with parameter updates disabled: the model is switched to inference
/// mode and no backward or optimizer calls are made. Each batch's loss is
/// accumulated and its predictions folded into a fresh metric engine of type
/// `M`.
///
/// Returns the mean loss and the final metric snapshot. The mean divides by
/// the number of batches, not samples, so a short final batch weighs the
/// same as a full one — this mirrors the accepted per-batch weighting of the
/// training loop.
pub fn evaluate<M: StreamingMetric>(
    model: &mut dyn Model,
    loader: &dyn BatchLoader,
    loss_fn: &dyn LossFn,
    num_classes: usize,
) -> Result<(f64, MetricSnapshot)> {
    if loader.is_empty() {
        return Err(Error::ConfigError(
            "cannot evaluate over an empty batch loader".to_string(),
        ));
    }

    model.set_training(false);

    let mut total_loss = 0.0;
    let mut num_batches = 0usize;
    let mut metric = M::new(num_classes)?;

    for batch in loader.batches() {
        let predictions = model.forward(&batch.inputs);
        total_loss += loss_fn.forward(&predictions, &batch.targets);
        metric.update(&predictions, &batch.targets);
        num_batches += 1;
    }

    Ok((total_loss / num_batches as f64, metric.compute()))
}
