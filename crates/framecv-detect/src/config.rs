//! Detector configuration
//!
//! Only the model file locations are configurable; the network's input
//! geometry, means and cut-off are fixed constants in the crate root.

use crate::{DetectError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROTOTXT: &str = "/deploy.prototxt";
pub const DEFAULT_WEIGHTS: &str = "/res10_300x300_ssd_iter_140000_fp16.caffemodel";

/// Where [`FaceNet`](crate::FaceNet) finds its two model files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Network topology (Caffe prototxt)
    pub prototxt: PathBuf,
    /// Network weights (Caffe binary)
    pub weights: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            prototxt: PathBuf::from(DEFAULT_PROTOTXT),
            weights: PathBuf::from(DEFAULT_WEIGHTS),
        }
    }
}

impl DetectorConfig {
    /// Read a JSON file; a missing key keeps its default path.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DetectError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| DetectError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_model_paths(mut self, prototxt: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
        self.prototxt = prototxt.into();
        self.weights = weights.into();
        self
    }
}
