//! 2D convolution layer, computed the direct way
//!
//! This module provides a Conv2DLayer that reproduces the forward step of the
//! external kernels: a valid-window convolution over all input channels, a
//! per-filter bias, then the layer's activation.

use crate::error::{OracleError, Result};
use crate::layers::{BiasVector, FeatureMap, Layer, LayerConfig, WeightTensor};
use crate::utils::Activation;

/// 2D convolution layer with fixed weights.
///
/// # Fields
///
/// * `config` - Filter size, channel counts and input dimensions
/// * `weights` - Kernels in `(dy, dx, input_channel, output_channel)` order
/// * `biases` - Bias for each output channel
/// * `activation` - Applied after the bias (sigmoid for layer 1, identity for layer 2)
///
/// # Example
///
/// ```ignore
/// use cnn_oracle::layers::{Conv2DLayer, LayerConfig};
/// use cnn_oracle::utils::Activation;
///
/// let config = LayerConfig::new(3, 1, 3, 5, 5)?;
/// let layer = Conv2DLayer::new(config, weights, vec![0.1, 0.2, 0.3], Activation::Sigmoid)?;
/// assert_eq!(layer.output_width(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Conv2DLayer {
    config: LayerConfig,
    weights: WeightTensor,
    biases: BiasVector,
    activation: Activation,
}

impl Conv2DLayer {
    /// Create a layer from flat weight and bias sequences.
    ///
    /// # Errors
    ///
    /// The config must be valid, `weights` must hold `f*f*k*n` values and
    /// `biases` exactly `n`; shorter or longer sequences are rejected.
    pub fn new(config: LayerConfig, weights: Vec<f64>, biases: Vec<f64>, activation: Activation) -> Result<Self> {
        config.validate()?;
        let weights = WeightTensor::for_layer(&config, weights)?;
        let biases = BiasVector::new(config.output_channels, biases)?;
        Ok(Self {
            config,
            weights,
            biases,
            activation,
        })
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn weights(&self) -> &WeightTensor {
        &self.weights
    }

    pub fn biases(&self) -> &BiasVector {
        &self.biases
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Get the number of input channels.
    pub fn in_channels(&self) -> usize {
        self.config.input_channels
    }

    /// Get the number of output channels (filters).
    pub fn out_channels(&self) -> usize {
        self.config.output_channels
    }

    /// Get the kernel size.
    pub fn kernel_size(&self) -> usize {
        self.config.filter_size
    }

    /// Get the padding around the window centre.
    pub fn padding(&self) -> usize {
        self.config.padding()
    }

    /// Get the output height: input_height - kernel_size + 1
    pub fn output_height(&self) -> usize {
        self.config.output_height()
    }

    /// Get the output width: input_width - kernel_size + 1
    pub fn output_width(&self) -> usize {
        self.config.output_width()
    }

    fn check_input(&self, input: &FeatureMap) -> Result<()> {
        let expected = (self.config.input_width, self.config.input_height, self.config.input_channels);
        let actual = (input.width(), input.height(), input.channels());
        if expected != actual {
            return Err(OracleError::ShapeMismatch {
                name: "layer input",
                expected: format!("{}x{}x{}", expected.0, expected.1, expected.2),
                actual: format!("{}x{}x{}", actual.0, actual.1, actual.2),
            });
        }
        Ok(())
    }

    /// Raw convolution sums, before bias and activation.
    ///
    /// Output position `(x, y)` is the window centred on input position
    /// `(x + pad, y + pad)`; every read lands inside the input because the
    /// output grid only covers valid windows.
    pub fn convolve(&self, input: &FeatureMap) -> Result<FeatureMap> {
        self.check_input(input)?;

        let f = self.config.filter_size;
        let pad = self.config.padding();
        let mut output = FeatureMap::zeros(self.output_width(), self.output_height(), self.out_channels());

        for y in 0..self.output_height() {
            for x in 0..self.output_width() {
                let (cx, cy) = (x + pad, y + pad);
                let acc = output.position_mut(x, y);
                for dy in 0..f {
                    for dx in 0..f {
                        let pixel = input.position(cx + dx - pad, cy + dy - pad);
                        for (input_channel, &value) in pixel.iter().enumerate() {
                            for (output_channel, sum) in acc.iter_mut().enumerate() {
                                *sum += self.weights.weight_at(dy, dx, input_channel, output_channel) * value;
                            }
                        }
                    }
                }
            }
        }

        Ok(output)
    }

    /// Total count of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

impl Layer for Conv2DLayer {
    fn forward(&self, input: &FeatureMap) -> Result<FeatureMap> {
        let mut output = self.convolve(input)?;
        let channels = output.channels();
        for values in output.as_mut_slice().chunks_exact_mut(channels) {
            for (output_channel, value) in values.iter_mut().enumerate() {
                *value = self.activation.apply(*value + self.biases.get(output_channel));
            }
        }
        Ok(output)
    }

    fn input_size(&self) -> usize {
        self.config.input_len()
    }

    fn output_size(&self) -> usize {
        self.config.output_len()
    }

    fn parameter_count(&self) -> usize {
        Conv2DLayer::parameter_count(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_filter(f: usize, size: usize, weight: f64) -> Conv2DLayer {
        let config = LayerConfig::new(f, 1, 1, size, size).unwrap();
        Conv2DLayer::new(config, vec![weight; f * f], vec![0.0], Activation::Identity).unwrap()
    }

    #[test]
    fn test_conv2d_accessors() {
        let layer = single_filter(3, 5, 1.0);

        assert_eq!(layer.in_channels(), 1);
        assert_eq!(layer.out_channels(), 1);
        assert_eq!(layer.kernel_size(), 3);
        assert_eq!(layer.padding(), 1);
        assert_eq!(layer.activation(), Activation::Identity);
    }

    #[test]
    fn test_conv2d_parameter_count() {
        let config = LayerConfig::new(3, 1, 8, 28, 28).unwrap();
        let layer = Conv2DLayer::new(config, vec![0.0; 72], vec![0.0; 8], Activation::Sigmoid).unwrap();

        // weights: 3 * 3 * 1 * 8 = 72, biases: 8
        assert_eq!(layer.parameter_count(), 80);
        assert_eq!(Layer::parameter_count(&layer), 80);
    }

    #[test]
    fn test_conv2d_output_dimensions() {
        let layer = single_filter(3, 28, 1.0);

        assert_eq!(layer.output_height(), 26);
        assert_eq!(layer.output_width(), 26);
        assert_eq!(layer.output_size(), 26 * 26);
        assert_eq!(layer.input_size(), 28 * 28);
    }

    #[test]
    fn test_box_filter_sums_window() {
        let layer = single_filter(3, 4, 1.0);
        let input = FeatureMap::new(4, 4, 1, (0..16).map(|i| i as f64).collect()).unwrap();

        let out = layer.convolve(&input).unwrap();
        // window at (0,0): 0+1+2+4+5+6+8+9+10
        assert_eq!(out.get(0, 0, 0), 45.0);
        assert_eq!(out.get(1, 0, 0), 54.0);
        assert_eq!(out.get(0, 1, 0), 81.0);
        assert_eq!(out.get(1, 1, 0), 90.0);
    }

    #[test]
    fn test_forward_adds_bias_then_activates() {
        let config = LayerConfig::new(1, 1, 2, 2, 1).unwrap();
        let layer = Conv2DLayer::new(config, vec![1.0, -1.0], vec![0.5, 0.5], Activation::Sigmoid).unwrap();
        let input = FeatureMap::new(2, 1, 1, vec![-0.5, 0.5]).unwrap();

        let out = layer.forward(&input).unwrap();
        assert_eq!(out.position(0, 0), &[0.5, crate::utils::sigmoid(1.0)]);
        assert_eq!(out.position(1, 0), &[crate::utils::sigmoid(1.0), 0.5]);
    }

    #[test]
    fn test_multi_channel_accumulates_every_input_channel() {
        let config = LayerConfig::new(1, 2, 1, 1, 1).unwrap();
        let layer = Conv2DLayer::new(config, vec![2.0, 3.0], vec![1.0], Activation::Identity).unwrap();
        let input = FeatureMap::new(1, 1, 2, vec![10.0, 100.0]).unwrap();

        assert_eq!(layer.forward(&input).unwrap().as_slice(), &[321.0]);
    }

    #[test]
    fn test_wrong_input_shape_rejected() {
        let layer = single_filter(3, 5, 1.0);
        let input = FeatureMap::zeros(4, 5, 1);

        assert!(matches!(
            layer.convolve(&input),
            Err(OracleError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_short_bias_rejected() {
        let config = LayerConfig::new(3, 1, 3, 5, 5).unwrap();
        assert!(Conv2DLayer::new(config, vec![0.0; 27], vec![0.1, 0.2], Activation::Sigmoid).is_err());
    }
}
