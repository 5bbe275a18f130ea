//! Tests for configuration, dataset and parameters files
//!
//! This file covers:
//! - Loading the network config fixture and its defaults
//! - Rejecting invalid configs
//! - Oracle datasets with and without a second layer
//! - Parameters files round-tripping through disk

use cnn_oracle::config::{load_config, parse_config, ParametersDistribution};
use cnn_oracle::dataset::{load_dataset, parse_dataset, DEFAULT_TOLERANCE};
use cnn_oracle::params::{load_parameters, NetworkParameters};
use cnn_oracle::utils::SimpleRng;
use cnn_oracle::OracleError;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// ============================================================================
// Network Config Tests
// ============================================================================

mod network_config_tests {
    use super::*;

    #[test]
    fn test_load_network_fixture() {
        let config = load_config("config/network.json").expect("Failed to load network config");

        assert_eq!((config.n1, config.n2), (4, 2));
        assert_eq!((config.f1, config.f2, config.f3), (3, 1, 3));
        assert_eq!(config.momentum, 0.9);
        assert_eq!(config.parameters_file.as_deref(), Some("config/parameters_small.json"));
        assert_eq!(config.parameters_distribution_3.std_deviation_w, 0.01);
        assert_eq!(config.parameters_distribution_3.mean_b, 0.0);
    }

    #[test]
    fn test_layer_config_for_input() {
        let config = load_config("config/network.json").unwrap();
        let l1 = config.layer_config(1, 32, 24).unwrap();
        let l2 = config.layer_config(2, l1.output_width(), l1.output_height()).unwrap();

        assert_eq!((l2.input_width, l2.input_height), (30, 22));
        assert_eq!(l2.input_channels, 4);
        assert!(matches!(config.layer_config(4, 32, 24), Err(OracleError::UnknownLayer(4))));
    }

    #[test]
    fn test_negative_distribution_made_positive() {
        let config = parse_config(
            r#"{ "n1": 2, "n2": 2, "f1": 3, "f2": 1, "f3": 3,
                 "learning_rates": [0.1, 0.1, 0.1],
                 "parameters_distribution_2": { "mean_w": -0.5, "std_deviation_w": -0.2 } }"#,
        )
        .unwrap();

        assert_eq!(
            config.parameters_distribution_2,
            ParametersDistribution {
                mean_w: 0.5,
                mean_b: 0.0,
                std_deviation_w: 0.2,
                std_deviation_b: 0.0,
            }
        );
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    fn expect_invalid(json: &str) {
        match parse_config(json) {
            Err(OracleError::InvalidConfig(_)) => {}
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_even_filter_size() {
        expect_invalid(r#"{ "n1": 2, "n2": 2, "f1": 4, "f2": 1, "f3": 3, "learning_rates": [0.1, 0.1, 0.1] }"#);
    }

    #[test]
    fn test_zero_filters() {
        expect_invalid(r#"{ "n1": 0, "n2": 2, "f1": 3, "f2": 1, "f3": 3, "learning_rates": [0.1, 0.1, 0.1] }"#);
    }

    #[test]
    fn test_wrong_learning_rate_count() {
        expect_invalid(r#"{ "n1": 2, "n2": 2, "f1": 3, "f2": 1, "f3": 3, "learning_rates": [0.1, 0.1] }"#);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_config("{ not json"), Err(OracleError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(load_config("config/does_not_exist.json"), Err(OracleError::Io(_))));
    }
}

// ============================================================================
// Dataset Tests
// ============================================================================

mod dataset_tests {
    use super::*;

    #[test]
    fn test_load_fixture_dataset() {
        let dataset = load_dataset("config/oracle_fixture.json").unwrap();

        assert_eq!(dataset.layer1.input.len(), 25);
        assert_eq!(dataset.layer1.weights.len(), 27);
        assert_eq!(dataset.tolerance, 0.001);
        let layer2 = dataset.layer2.as_ref().unwrap();
        assert!(layer2.input.is_none());
        assert_eq!(layer2.weights.len(), 54);
    }

    #[test]
    fn test_layer1_only_dataset() {
        let dataset = parse_dataset(
            r#"{ "layer1": { "f": 1, "n": 1, "input_w": 2, "input_h": 1,
                             "input": [0, 255], "weights": [1], "bias": [0] } }"#,
        )
        .unwrap();

        assert!(dataset.layer2.is_none());
        assert!(dataset.layer1.output.is_none());
        assert_eq!(dataset.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_dataset_from_temp_file() {
        let mut file = NamedTempFile::new().expect("failed to create temp dataset");
        file.write_all(
            br#"{ "layer1": { "f": 3, "n": 1, "input_w": 3, "input_h": 3,
                   "input": [1, 2, 3, 4, 5, 6, 7, 8, 9],
                   "weights": [0, 0, 0, 0, 1, 0, 0, 0, 0], "bias": [0.5] } }"#,
        )
        .expect("failed to write temp dataset");

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.layer1.layer_config().unwrap().output_len(), 1);
    }
}

// ============================================================================
// Parameters File Tests
// ============================================================================

mod parameters_tests {
    use super::*;

    #[test]
    fn test_small_parameters_match_config() {
        let config = load_config("config/network.json").unwrap();
        let params = load_parameters("config/parameters_small.json").unwrap();

        for layer in 1..=3 {
            params.weight_tensor(&config, layer).unwrap();
            params.bias_vector(&config, layer).unwrap();
        }
    }

    #[test]
    fn test_save_and_load() {
        let config = load_config("config/network.json").unwrap();
        let params = NetworkParameters::random(&config, &mut SimpleRng::new(11)).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("parameters.json");

        params.save(&path).unwrap();
        let loaded = load_parameters(&path).unwrap();
        for layer in 1..=3 {
            let (a, b) = (loaded.layer(layer).unwrap(), params.layer(layer).unwrap());
            assert_eq!(a.weights.len(), b.weights.len());
            assert_eq!(a.bias.len(), b.bias.len());
            for (x, y) in a.weights.iter().zip(&b.weights) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_random_draws_follow_distribution() {
        let config = load_config("config/network.json").unwrap();
        let params = NetworkParameters::random(&config, &mut SimpleRng::new(5)).unwrap();

        // std_deviation_b is 0 for every layer, so biases equal mean_b
        assert!(params.layer1.bias.iter().all(|&b| b == 0.0));
        let max = params.layer3.weights.iter().fold(0.0f64, |m, w| m.max(w.abs()));
        assert!(max < 0.1, "layer 3 weights should stay near 0, got {}", max);
    }
}
