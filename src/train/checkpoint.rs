//! Checkpoint persistence
//!
//! Two checkpoints exist per run: "last", overwritten after every epoch,
//! and "best", overwritten only when validation loss improves. Both live
//! under `<output_root>/<run_name>/` as `<run_name>_last.json` and
//! `<run_name>_best.json`. Writes go to a temporary file in the same
//! directory and are renamed into place, so a crash mid-write leaves the
//! previous valid checkpoint untouched.

use crate::error::{Error, Result};
use crate::model::StateDict;
use crate::train::EpochRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which of the two checkpoints of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Written unconditionally after every epoch
    Last,
    /// Written when validation loss improves (ties included)
    Best,
}

impl Variant {
    fn suffix(self) -> &'static str {
        match self {
            Variant::Last => "last",
            Variant::Best => "best",
        }
    }
}

/// Path of a run's checkpoint file
pub fn checkpoint_path(output_root: &Path, run_name: &str, variant: Variant) -> PathBuf {
    output_root
        .join(run_name)
        .join(format!("{}_{}.json", run_name, variant.suffix()))
}

/// Persisted training state
///
/// Holds extracted state only (named parameter buffers), never live
/// objects, so the on-disk format is independent of any concrete model or
/// optimizer type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Model parameters
    pub model: StateDict,

    /// Optimizer internal state
    pub optimizer: StateDict,

    /// Scheduler internal state, if a scheduler is configured
    pub scheduler: Option<StateDict>,

    /// Minimum validation loss seen through the recorded epochs
    pub min_val_loss: f64,

    /// Full epoch history up to and including `epoch`
    pub records: Vec<EpochRecord>,

    /// Epoch index this checkpoint was written at
    pub epoch: usize,
}

impl Checkpoint {
    /// Write the checkpoint atomically
    ///
    /// Serializes to `<path>.tmp` in the target directory, then renames
    /// over the final path.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string(self)
            .map_err(|e| Error::Serialization(format!("checkpoint serialization failed: {e}")))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, data.as_bytes())?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a checkpoint from disk
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            Error::Checkpoint(format!("cannot read checkpoint {}: {e}", path.display()))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            Error::Checkpoint(format!(
                "cannot parse checkpoint {}: {e}",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ConfusionMatrix;

    fn sample_checkpoint() -> Checkpoint {
        let mut model = StateDict::new();
        model.insert("encoder.weight".to_string(), vec![0.25, -1.5]);
        let snapshot = ConfusionMatrix::new(2).unwrap().compute();
        Checkpoint {
            model,
            optimizer: StateDict::new(),
            scheduler: None,
            min_val_loss: 0.42,
            records: vec![EpochRecord {
                epoch: 0,
                train_loss: 0.9,
                val_loss: 0.42,
                metrics: snapshot,
                train_secs: 1.25,
            }],
            epoch: 0,
        }
    }

    #[test]
    fn test_checkpoint_paths() {
        let last = checkpoint_path(Path::new("/out"), "unet", Variant::Last);
        let best = checkpoint_path(Path::new("/out"), "unet", Variant::Best);
        assert_eq!(last, PathBuf::from("/out/unet/unet_last.json"));
        assert_eq!(best, PathBuf::from("/out/unet/unet_best.json"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "run", Variant::Last);

        let ckpt = sample_checkpoint();
        ckpt.save(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.epoch, 0);
        assert_eq!(loaded.min_val_loss, 0.42);
        assert_eq!(loaded.records, ckpt.records);
        assert_eq!(loaded.model["encoder.weight"], vec![0.25, -1.5]);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "run", Variant::Last);
        sample_checkpoint().save(&path).unwrap();

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("run_last.json")]);
    }

    #[test]
    fn test_overwrite_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "run", Variant::Last);

        let mut ckpt = sample_checkpoint();
        ckpt.save(&path).unwrap();
        ckpt.epoch = 7;
        ckpt.save(&path).unwrap();

        assert_eq!(Checkpoint::load(&path).unwrap().epoch, 7);
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(Error::Checkpoint(_))
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(Checkpoint::load(&path).is_err());
    }
}
