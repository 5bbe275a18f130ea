//! Layer trait definition
//!
//! This module defines the forward-only interface every oracle layer provides.

use crate::error::Result;
use crate::layers::FeatureMap;

/// Core trait for oracle layers.
///
/// A layer maps an input [`FeatureMap`] to an output one. There is no
/// backward pass: the oracle only reproduces what the kernels compute going
/// forward.
///
/// # Example
///
/// ```ignore
/// let output = layer.forward(&input)?;
/// assert_eq!(output.as_slice().len(), layer.output_size());
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// # Errors
    ///
    /// Fails when `input` does not have the shape the layer was configured for.
    fn forward(&self, input: &FeatureMap) -> Result<FeatureMap>;

    /// Number of values in one input feature map.
    fn input_size(&self) -> usize;

    /// Number of values in one output feature map.
    fn output_size(&self) -> usize;

    /// Total count of weights and biases.
    fn parameter_count(&self) -> usize;
}
