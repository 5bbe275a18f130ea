//! Reference forward pass for the first two network layers.
//!
//! Layer 1 normalises raw pixels to `[0, 1]`, centres them on the image mean,
//! convolves with `n1` filters, adds bias and applies a sigmoid. Layer 2
//! convolves layer 1's `n1` channels with `n2` filters and adds bias; its
//! output is left linear.
//!
//! Everything is computed in `f64` with plain nested loops so the results can
//! be trusted when diffing against the optimised kernels.

use crate::dataset::OracleDataset;
use crate::error::{require_len, OracleError, Result};
use crate::layers::{Conv2DLayer, FeatureMap, Layer, LayerConfig};
use crate::report::{compare, Mismatch};
use crate::utils::Activation;
use log::{debug, info};

/// Raw pixel values are bytes.
pub const PIXEL_SCALE: f64 = 255.0;

/// Divide every raw pixel by 255.
pub fn normalize_pixels(raw: &[f64]) -> Vec<f64> {
    raw.iter().map(|&p| p / PIXEL_SCALE).collect()
}

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Subtract the mean of the whole sequence from every value.
pub fn mean_center(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    values.iter().map(|&v| v - m).collect()
}

/// Layer-1 preprocessing: normalise, then centre over the whole image.
pub fn preprocess_pixels(raw: &[f64]) -> Vec<f64> {
    mean_center(&normalize_pixels(raw))
}

fn check_layer1_config(config: &LayerConfig) -> Result<()> {
    config.validate()?;
    if config.input_channels != 1 {
        return Err(OracleError::InvalidConfig(format!(
            "layer 1 reads a single channel, got {} input channels",
            config.input_channels
        )));
    }
    Ok(())
}

fn pixel_map(config: &LayerConfig, pixels: &[f64]) -> Result<FeatureMap> {
    require_len("input", config.input_len(), pixels.len())?;
    FeatureMap::new(config.input_width, config.input_height, 1, preprocess_pixels(pixels))
}

/// Layer 1 on raw pixels.
///
/// `config.input_channels` must be 1, `pixels` must hold
/// `input_width * input_height` values, `weights` `f1*f1*n1` and `bias` `n1`.
pub fn layer1_forward(config: &LayerConfig, pixels: &[f64], weights: &[f64], bias: &[f64]) -> Result<FeatureMap> {
    check_layer1_config(config)?;
    let layer = Conv2DLayer::new(*config, weights.to_vec(), bias.to_vec(), Activation::Sigmoid)?;
    layer.forward(&pixel_map(config, pixels)?)
}

/// Layer 2 on a flattened layer-1 output.
///
/// `layer2` must be what `layer1.next(f2, n2)` derives: its input is layer 1's
/// output grid with `n1` channels, addressed `(y * w1 + x) * n1 + channel`.
/// The output grid is `(input_w - f1 - f2 + 2) × (input_h - f1 - f2 + 2)`.
pub fn layer2_forward(
    layer1: &LayerConfig,
    layer2: &LayerConfig,
    input: &[f64],
    weights: &[f64],
    bias: &[f64],
) -> Result<FeatureMap> {
    let expected = layer1.next(layer2.filter_size, layer2.output_channels)?;
    if expected != *layer2 {
        return Err(OracleError::ShapeMismatch {
            name: "layer 2 config",
            expected: format!("{:?}", expected),
            actual: format!("{:?}", layer2),
        });
    }
    let input = FeatureMap::new(
        layer2.input_width,
        layer2.input_height,
        layer2.input_channels,
        input.to_vec(),
    )?;
    let layer = Conv2DLayer::new(*layer2, weights.to_vec(), bias.to_vec(), Activation::Identity)?;
    layer.forward(&input)
}

/// Outputs of one oracle run.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutput {
    pub layer1: FeatureMap,
    pub layer2: Option<FeatureMap>,
}

/// Differences between an oracle run and the expected outputs of its dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verification {
    pub layer1: Vec<Mismatch>,
    pub layer2: Vec<Mismatch>,
    /// Number of layers that carried expected values
    pub checked_layers: usize,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.layer1.is_empty() && self.layer2.is_empty()
    }
}

/// Configured layer 1 and optional layer 2, built once from a dataset.
#[derive(Debug, Clone)]
pub struct ForwardOracle {
    layer1: Conv2DLayer,
    layer2: Option<Conv2DLayer>,
}

impl ForwardOracle {
    pub fn new(layer1: Conv2DLayer, layer2: Option<Conv2DLayer>) -> Result<Self> {
        check_layer1_config(layer1.config())?;
        if let Some(l2) = &layer2 {
            let expected = layer1.config().next(l2.kernel_size(), l2.out_channels())?;
            if expected != *l2.config() {
                return Err(OracleError::ShapeMismatch {
                    name: "layer 2 config",
                    expected: format!("{:?}", expected),
                    actual: format!("{:?}", l2.config()),
                });
            }
        }
        Ok(Self { layer1, layer2 })
    }

    /// Build both layers from a dataset, validating every length.
    pub fn from_dataset(dataset: &OracleDataset) -> Result<Self> {
        let d1 = &dataset.layer1;
        let config1 = d1.layer_config()?;
        let layer1 = Conv2DLayer::new(config1, d1.weights.clone(), d1.bias.clone(), Activation::Sigmoid)?;

        let layer2 = match &dataset.layer2 {
            Some(d2) => {
                let config2 = config1.next(d2.f, d2.n)?;
                Some(Conv2DLayer::new(
                    config2,
                    d2.weights.clone(),
                    d2.bias.clone(),
                    Activation::Identity,
                )?)
            }
            None => None,
        };

        Self::new(layer1, layer2)
    }

    pub fn layer1(&self) -> &Conv2DLayer {
        &self.layer1
    }

    pub fn layer2(&self) -> Option<&Conv2DLayer> {
        self.layer2.as_ref()
    }

    /// Layer-1 activations for raw pixels.
    pub fn layer1_output(&self, pixels: &[f64]) -> Result<FeatureMap> {
        self.layer1.forward(&pixel_map(self.layer1.config(), pixels)?)
    }

    /// Layer-2 sums for a layer-1 output, `None` when no second layer is configured.
    pub fn layer2_output(&self, input: &FeatureMap) -> Result<Option<FeatureMap>> {
        self.layer2.as_ref().map(|layer| layer.forward(input)).transpose()
    }

    /// Run both layers. `layer2_input` replaces the computed layer-1 output as
    /// layer 2's input when given.
    pub fn run(&self, pixels: &[f64], layer2_input: Option<&[f64]>) -> Result<OracleOutput> {
        let config = self.layer1.config();
        info!(
            "layer 1: {}x{} input, f={}, n={}",
            config.input_width, config.input_height, config.filter_size, config.output_channels
        );
        let layer1 = self.layer1_output(pixels)?;

        let layer2 = match (&self.layer2, layer2_input) {
            (Some(layer), Some(values)) => {
                debug!("layer 2 reads {} values supplied by the dataset", values.len());
                let c = layer.config();
                let input = FeatureMap::new(c.input_width, c.input_height, c.input_channels, values.to_vec())?;
                Some(layer.forward(&input)?)
            }
            (Some(layer), None) => Some(layer.forward(&layer1)?),
            (None, _) => None,
        };

        Ok(OracleOutput { layer1, layer2 })
    }

    /// Build from `dataset` and run it on its own inputs.
    pub fn run_dataset(dataset: &OracleDataset) -> Result<OracleOutput> {
        let oracle = Self::from_dataset(dataset)?;
        let layer2_input = dataset.layer2.as_ref().and_then(|d| d.input.as_deref());
        oracle.run(&dataset.layer1.input, layer2_input)
    }
}

impl OracleOutput {
    /// Compare against the `output` arrays a dataset carries.
    pub fn verify(&self, dataset: &OracleDataset) -> Result<Verification> {
        let mut verification = Verification::default();

        if let Some(expected) = &dataset.layer1.output {
            verification.layer1 = compare(expected, &self.layer1, dataset.tolerance)?;
            verification.checked_layers += 1;
        }

        let expected2 = dataset.layer2.as_ref().and_then(|d| d.output.as_ref());
        if let (Some(expected), Some(actual)) = (expected2, &self.layer2) {
            verification.layer2 = compare(expected, actual, dataset.tolerance)?;
            verification.checked_layers += 1;
        }

        Ok(verification)
    }
}
