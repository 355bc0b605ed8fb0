//! Per-dataset image normalization parameters
//!
//! Aerial/satellite collections differ enough in channel statistics that
//! each dataset carries its own mean/std. The table is an explicit value
//! handed to dataset construction, not ambient process state: look up the
//! dataset identifier, fall back to the generic defaults for unknown names.

use ndarray::{Array4, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Channel-wise normalization parameters for three-channel imagery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalization {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        Self { mean, std }
    }

    /// Normalize a batch in place: `x = (x - mean) / std` per channel
    pub fn apply(&self, images: &mut Array4<f32>) {
        assert_eq!(images.dim().1, 3, "expected three-channel imagery");
        for (c, mut channel) in images.axis_iter_mut(Axis(1)).enumerate() {
            channel.mapv_inplace(|x| (x - self.mean[c]) / self.std[c]);
        }
    }

    /// Parameters that undo `apply`, for rendering normalized tensors back
    /// as viewable images
    pub fn inverse(&self) -> Normalization {
        let mut mean = [0.0; 3];
        let mut std = [0.0; 3];
        for c in 0..3 {
            mean[c] = -self.mean[c] / self.std[c];
            std[c] = 1.0 / self.std[c];
        }
        Normalization { mean, std }
    }
}

/// Lookup table from dataset identifier to normalization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormStats {
    table: BTreeMap<String, Normalization>,
    fallback: Normalization,
}

impl NormStats {
    /// Empty table with the ImageNet-derived fallback
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            fallback: Normalization::new([0.485, 0.56, 0.406], [0.229, 0.224, 0.225]),
        }
    }

    /// Table pre-populated with the supported aerial datasets
    pub fn with_defaults() -> Self {
        let mut stats = Self::new();
        stats.insert(
            "imagenet",
            Normalization::new([0.485, 0.456, 0.406], [0.229, 0.224, 0.225]),
        );
        stats.insert(
            "potsdam",
            Normalization::new([0.349, 0.371, 0.347], [0.1196, 0.1164, 0.1197]),
        );
        stats.insert(
            "potsdam_irrg",
            Normalization::new([0.3823, 0.3625, 0.3364], [0.1172, 0.1167, 0.1203]),
        );
        stats.insert(
            "floodnet",
            Normalization::new([0.4159, 0.4499, 0.3466], [0.1297, 0.1197, 0.1304]),
        );
        stats.insert(
            "vaihingen",
            Normalization::new([0.4731, 0.3206, 0.3182], [0.1970, 0.1306, 0.1276]),
        );
        stats
    }

    pub fn insert(&mut self, dataset: impl Into<String>, norm: Normalization) {
        self.table.insert(dataset.into(), norm);
    }

    /// Parameters for a dataset, or the fallback for unknown names
    pub fn get(&self, dataset: &str) -> Normalization {
        self.table.get(dataset).copied().unwrap_or(self.fallback)
    }

    pub fn contains(&self, dataset: &str) -> bool {
        self.table.contains_key(dataset)
    }
}

impl Default for NormStats {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array4;

    #[test]
    fn test_known_dataset_lookup() {
        let stats = NormStats::with_defaults();
        assert!(stats.contains("potsdam"));
        assert_abs_diff_eq!(stats.get("potsdam").mean[0], 0.349);
        assert_abs_diff_eq!(stats.get("vaihingen").std[2], 0.1276);
    }

    #[test]
    fn test_unknown_dataset_falls_back() {
        let stats = NormStats::with_defaults();
        let norm = stats.get("no-such-dataset");
        assert_abs_diff_eq!(norm.mean[1], 0.56);
        assert_abs_diff_eq!(norm.std[0], 0.229);
    }

    #[test]
    fn test_apply_then_inverse_round_trips() {
        let stats = NormStats::with_defaults();
        let norm = stats.get("floodnet");

        let original = Array4::from_shape_fn((1, 3, 2, 2), |(_, c, h, w)| {
            0.1 * (c as f32 + 1.0) + 0.01 * (h + w) as f32
        });
        let mut images = original.clone();
        norm.apply(&mut images);
        norm.inverse().apply(&mut images);

        for (a, b) in images.iter().zip(original.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_injected_entry_overrides() {
        let mut stats = NormStats::new();
        stats.insert("custom", Normalization::new([0.5; 3], [0.25; 3]));

        let mut images = Array4::from_elem((1, 3, 1, 1), 0.75f32);
        stats.get("custom").apply(&mut images);
        for v in images.iter() {
            assert_abs_diff_eq!(*v, 1.0);
        }
    }
}
