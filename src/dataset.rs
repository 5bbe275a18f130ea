//! Oracle dataset files.
//!
//! A dataset describes one oracle run: layer 1's shape, raw pixels and
//! parameters, optionally layer 2's, and optionally the kernel output to
//! check against.
//!
//! ```json
//! {
//!   "layer1": { "f": 3, "n": 3, "input_w": 5, "input_h": 5,
//!               "input": [0.0, 255.0, ...], "weights": [...], "bias": [0.1, 0.2, 0.3] },
//!   "layer2": { "f": 3, "n": 2, "weights": [...], "bias": [0.1, 0.2] },
//!   "tolerance": 0.001
//! }
//! ```

use crate::error::Result;
use crate::layers::LayerConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default absolute tolerance when checking expected outputs (3 decimals).
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// First layer: single-channel raw pixels in, `n` sigmoid channels out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer1Data {
    pub f: usize,
    pub n: usize,
    pub input_w: usize,
    pub input_h: usize,
    /// Raw pixel values in 0..=255, row-major
    pub input: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
    /// Expected activations to compare against
    #[serde(default)]
    pub output: Option<Vec<f64>>,
}

impl Layer1Data {
    pub fn layer_config(&self) -> Result<LayerConfig> {
        LayerConfig::new(self.f, 1, self.n, self.input_w, self.input_h)
    }
}

/// Second layer: consumes layer 1's output, no activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer2Data {
    pub f: usize,
    pub n: usize,
    /// Flattened layer-1 output to use instead of the computed one
    #[serde(default)]
    pub input: Option<Vec<f64>>,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub output: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleDataset {
    pub layer1: Layer1Data,
    #[serde(default)]
    pub layer2: Option<Layer2Data>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// Read a dataset from a JSON file. Shapes are validated when the oracle is built.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<OracleDataset> {
    let path = path.as_ref();
    debug!("loading oracle dataset from '{}'", path.display());
    let contents = fs::read_to_string(path)?;
    parse_dataset(&contents)
}

pub fn parse_dataset(contents: &str) -> Result<OracleDataset> {
    Ok(serde_json::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "layer1": { "f": 1, "n": 1, "input_w": 1, "input_h": 1,
                        "input": [3.0], "weights": [1.0], "bias": [0.0] }
        }"#;
        let ds = parse_dataset(json).unwrap();

        assert!(ds.layer2.is_none());
        assert!(ds.layer1.output.is_none());
        assert_eq!(ds.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_negative_dimension_is_input_error() {
        let json = r#"{
            "layer1": { "f": 3, "n": -1, "input_w": 5, "input_h": 5,
                        "input": [], "weights": [], "bias": [] }
        }"#;
        assert!(matches!(parse_dataset(json), Err(OracleError::Json(_))));
    }

    #[test]
    fn test_layer1_config() {
        let json = r#"{
            "layer1": { "f": 3, "n": 4, "input_w": 7, "input_h": 6,
                        "input": [], "weights": [], "bias": [] }
        }"#;
        let cfg = parse_dataset(json).unwrap().layer1.layer_config().unwrap();
        assert_eq!(cfg, LayerConfig::new(3, 1, 4, 7, 6).unwrap());
    }
}
