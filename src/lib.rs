//! Reference forward pass and training toolbox for a three-layer
//! super-resolution CNN.
//!
//! The oracle recomputes the first two convolutional layers in plain `f64`
//! so that traces of the optimised kernels can be checked value by value.
//!
//! # Modules
//!
//! - `oracle`: layer-1/layer-2 forward pass and verification against traces
//! - `layers`: layer shapes, weight layout, feature maps and the convolution
//! - `dataset`: JSON datasets the oracle runs on
//! - `report`: `row:col = values` output and mismatch detection
//! - `config`: network configuration shared with the training program
//! - `params`: trained parameters file
//! - `luma`: luma channel extraction from images
//! - `tools`: training scheduler, kernel profiler, sample generator, heatmaps
//! - `utils`: RNG and activation functions

pub mod config;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod luma;
pub mod oracle;
pub mod params;
pub mod report;
pub mod tools;
pub mod utils;

pub use error::{OracleError, Result};
