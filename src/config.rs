//! Network configuration
//!
//! This module provides the configuration shared with the external training
//! program: filter counts and spatial sizes of the three layers, optimiser
//! settings and the distributions initial parameters are drawn from.

use crate::error::{OracleError, Result};
use crate::layers::LayerConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Normal distributions for a layer's initial weights and biases.
///
/// Missing fields fall back to `mean_w = 0.01`, `std_deviation_w = 0.01`,
/// `mean_b = 0.0`, `std_deviation_b = 0.0`. Negative values are made positive
/// when the config is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersDistribution {
    pub mean_w: f64,
    pub mean_b: f64,
    pub std_deviation_w: f64,
    pub std_deviation_b: f64,
}

impl Default for ParametersDistribution {
    fn default() -> Self {
        Self {
            mean_w: 0.01,
            mean_b: 0.0,
            std_deviation_w: 0.01,
            std_deviation_b: 0.0,
        }
    }
}

impl ParametersDistribution {
    fn make_positive(&mut self) {
        self.mean_w = self.mean_w.abs();
        self.mean_b = self.mean_b.abs();
        self.std_deviation_w = self.std_deviation_w.abs();
        self.std_deviation_b = self.std_deviation_b.abs();
    }
}

impl fmt::Display for ParametersDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ weights({}, {}), bias({}, {}) }}",
            self.mean_w, self.std_deviation_w, self.mean_b, self.std_deviation_b
        )
    }
}

/// Configuration of the three-layer network.
///
/// Layer 1 maps the luma channel to `n1` filters of size `f1`, layer 2 maps
/// `n1` channels to `n2` filters of size `f2`, layer 3 maps `n2` channels back
/// to a single channel with filters of size `f3`.
///
/// # Example
///
/// ```json
/// {
///   "n1": 32, "n2": 16,
///   "f1": 9, "f2": 1, "f3": 5,
///   "momentum": 0.9,
///   "weight_decay_parameter": 0.0001,
///   "learning_rates": [0.0001, 0.0001, 0.00001],
///   "parameters_file": "data/parameters.json",
///   "parameters_distribution_1": { "mean_w": 0.0, "std_deviation_w": 0.001 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub n1: usize,
    pub n2: usize,
    pub f1: usize,
    pub f2: usize,
    pub f3: usize,

    #[serde(default)]
    pub momentum: f64,

    #[serde(default)]
    pub weight_decay_parameter: f64,

    /// One learning rate per layer
    pub learning_rates: Vec<f64>,

    /// Where the training program reads and writes weights and biases
    #[serde(default)]
    pub parameters_file: Option<String>,

    #[serde(default)]
    pub parameters_distribution_1: ParametersDistribution,
    #[serde(default)]
    pub parameters_distribution_2: ParametersDistribution,
    #[serde(default)]
    pub parameters_distribution_3: ParametersDistribution,
}

impl NetworkConfig {
    /// `(f, k, n)` of a layer: filter size, input channels, output channels.
    pub fn layer_shape(&self, layer: usize) -> Result<(usize, usize, usize)> {
        match layer {
            1 => Ok((self.f1, 1, self.n1)),
            2 => Ok((self.f2, self.n1, self.n2)),
            3 => Ok((self.f3, self.n2, 1)),
            other => Err(OracleError::UnknownLayer(other)),
        }
    }

    /// Shape of a layer for a concrete input size.
    pub fn layer_config(&self, layer: usize, input_width: usize, input_height: usize) -> Result<LayerConfig> {
        let (f, k, n) = self.layer_shape(layer)?;
        LayerConfig::new(f, k, n, input_width, input_height)
    }

    pub fn parameters_distribution(&self, layer: usize) -> Result<&ParametersDistribution> {
        match layer {
            1 => Ok(&self.parameters_distribution_1),
            2 => Ok(&self.parameters_distribution_2),
            3 => Ok(&self.parameters_distribution_3),
            other => Err(OracleError::UnknownLayer(other)),
        }
    }

    /// Pixels lost on each axis after all three layers.
    pub fn total_padding(&self) -> usize {
        self.f1 + self.f2 + self.f3 - 3
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config {{")?;
        writeln!(
            f,
            "  parameters file: '{}'",
            self.parameters_file.as_deref().unwrap_or("")
        )?;
        writeln!(f, "  momentum: {}", self.momentum)?;
        writeln!(f, "  learning rates: {:?}", self.learning_rates)?;
        writeln!(f, "  layer 1: {} filters, {} spatial size", self.n1, self.f1)?;
        writeln!(f, "  layer 2: {} filters, {} spatial size", self.n2, self.f2)?;
        writeln!(f, "  layer 3: {} spatial size", self.f3)?;
        writeln!(f, "  parameters dist. 1 {}", self.parameters_distribution_1)?;
        writeln!(f, "  parameters dist. 2 {}", self.parameters_distribution_2)?;
        write!(f, "  parameters dist. 3 {}}}", self.parameters_distribution_3)
    }
}

/// Loads a network configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it, makes the distribution values
/// positive and validates the result.
///
/// # Examples
///
/// ```no_run
/// use cnn_oracle::config::load_config;
///
/// let cfg = load_config("config/network.json").unwrap();
/// assert_eq!(cfg.learning_rates.len(), 3);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<NetworkConfig> {
    let path = path.as_ref();
    debug!("loading network config from '{}'", path.display());
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate a network configuration from a JSON string.
pub fn parse_config(contents: &str) -> Result<NetworkConfig> {
    let mut config: NetworkConfig = serde_json::from_str(contents)?;
    config.parameters_distribution_1.make_positive();
    config.parameters_distribution_2.make_positive();
    config.parameters_distribution_3.make_positive();
    validate_config(&config)?;
    Ok(config)
}

fn invalid(msg: &str) -> OracleError {
    OracleError::InvalidConfig(msg.to_string())
}

/// Check every invariant of a [`NetworkConfig`].
pub fn validate_config(config: &NetworkConfig) -> Result<()> {
    // spatial sizes must be odd so the window has a centre
    for (name, f) in [("f1", config.f1), ("f2", config.f2), ("f3", config.f3)] {
        if f == 0 {
            return Err(OracleError::InvalidConfig(format!("{} should be > 0", name)));
        }
        if f % 2 == 0 {
            return Err(OracleError::InvalidConfig(format!("{} should be odd", name)));
        }
    }

    if config.n1 == 0 {
        return Err(invalid("n1 should be > 0"));
    }
    if config.n2 == 0 {
        return Err(invalid("n2 should be > 0"));
    }

    if config.weight_decay_parameter < 0.0 {
        return Err(invalid("weight_decay_parameter must be non-negative"));
    }

    if config.learning_rates.len() != 3 {
        return Err(invalid(
            "expected 3 learning rates (one per layer) to be provided",
        ));
    }
    if config.learning_rates.iter().any(|&lr| lr <= 0.0) {
        return Err(invalid("all learning rates should be > 0"));
    }

    for distribution in [
        &config.parameters_distribution_1,
        &config.parameters_distribution_2,
        &config.parameters_distribution_3,
    ] {
        if distribution.std_deviation_w <= 0.0 {
            return Err(invalid("std dev. for weights should be > 0"));
        }
        if distribution.std_deviation_b < 0.0 {
            return Err(invalid("std dev. for bias should be >= 0"));
        }
    }

    Ok(())
}
