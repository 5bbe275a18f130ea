//! Trained parameters file.
//!
//! The training program stores weights and biases of all three layers in one
//! JSON document. Weight arrays use the same flat layout as [`WeightTensor`].
//!
//! ```json
//! {
//!   "layer1": { "weights": [...], "bias": [...] },
//!   "layer2": { "weights": [...], "bias": [...] },
//!   "layer3": { "weights": [...], "bias": [...] }
//! }
//! ```

use crate::config::NetworkConfig;
use crate::error::{OracleError, Result};
use crate::layers::{BiasVector, WeightTensor};
use crate::utils::SimpleRng;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub layer1: LayerParameters,
    pub layer2: LayerParameters,
    pub layer3: LayerParameters,
}

impl NetworkParameters {
    /// Parameters drawn from each layer's distribution in `config`.
    pub fn random(config: &NetworkConfig, rng: &mut SimpleRng) -> Result<Self> {
        let mut draw = |layer: usize| -> Result<LayerParameters> {
            let (f, k, n) = config.layer_shape(layer)?;
            let distribution = config.parameters_distribution(layer)?;
            let weights = WeightTensor::from_distribution(f, k, n, distribution, rng)?;
            let bias = BiasVector::from_distribution(n, distribution, rng);
            Ok(LayerParameters {
                weights: weights.into_vec(),
                bias: bias.into_vec(),
            })
        };
        Ok(Self {
            layer1: draw(1)?,
            layer2: draw(2)?,
            layer3: draw(3)?,
        })
    }

    pub fn layer(&self, layer: usize) -> Result<&LayerParameters> {
        match layer {
            1 => Ok(&self.layer1),
            2 => Ok(&self.layer2),
            3 => Ok(&self.layer3),
            other => Err(OracleError::UnknownLayer(other)),
        }
    }

    /// Weights of `layer`, shaped and length-checked against `config`.
    pub fn weight_tensor(&self, config: &NetworkConfig, layer: usize) -> Result<WeightTensor> {
        let (f, k, n) = config.layer_shape(layer)?;
        WeightTensor::new(f, k, n, self.layer(layer)?.weights.clone())
    }

    /// Biases of `layer`, length-checked against `config`.
    pub fn bias_vector(&self, config: &NetworkConfig, layer: usize) -> Result<BiasVector> {
        let (_, _, n) = config.layer_shape(layer)?;
        BiasVector::new(n, self.layer(layer)?.bias.clone())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("writing parameters to '{}'", path.display());
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Read a parameters file.
pub fn load_parameters(path: impl AsRef<Path>) -> Result<NetworkParameters> {
    let path = path.as_ref();
    debug!("loading layer parameters from '{}'", path.display());
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn config() -> NetworkConfig {
        parse_config(
            r#"{ "n1": 4, "n2": 2, "f1": 3, "f2": 1, "f3": 5,
                 "learning_rates": [0.1, 0.1, 0.1] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_random_parameters_match_shapes() {
        let cfg = config();
        let params = NetworkParameters::random(&cfg, &mut SimpleRng::new(3)).unwrap();

        assert_eq!(params.layer1.weights.len(), 3 * 3 * 1 * 4);
        assert_eq!(params.layer2.weights.len(), 1 * 1 * 4 * 2);
        assert_eq!(params.layer3.weights.len(), 5 * 5 * 2 * 1);
        assert_eq!(params.layer3.bias.len(), 1);
        for layer in 1..=3 {
            assert!(params.weight_tensor(&cfg, layer).is_ok());
            assert!(params.bias_vector(&cfg, layer).is_ok());
        }
    }

    #[test]
    fn test_weight_tensor_rejects_wrong_length() {
        let cfg = config();
        let mut params = NetworkParameters::random(&cfg, &mut SimpleRng::new(3)).unwrap();
        params.layer2.weights.pop();

        assert!(matches!(
            params.weight_tensor(&cfg, 2),
            Err(OracleError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_layer() {
        let params = NetworkParameters::default();
        assert!(matches!(params.layer(0), Err(OracleError::UnknownLayer(0))));
    }
}
