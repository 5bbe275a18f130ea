//! Tests for weight heatmaps written from the parameters fixture

use cnn_oracle::config::load_config;
use cnn_oracle::layers::WeightTensor;
use cnn_oracle::params::load_parameters;
use cnn_oracle::tools::heatmap::{normalize_filter, CELL_PADDING};
use cnn_oracle::tools::{render_weights, visualize_layer, GridLayout};
use image::Rgb;
use tempfile::tempdir;

// ============================================================================
// Layout Tests
// ============================================================================

mod layout_tests {
    use super::*;

    #[test]
    fn test_grid_covers_all_filters() {
        for filters in 1..50u32 {
            let layout = GridLayout::new(3, filters, 4);
            assert!(layout.rows * layout.cols >= filters);
            assert!(layout.cols >= layout.rows);
            assert!(layout.rows * (layout.cols - 1) < filters);
        }
    }

    #[test]
    fn test_normalized_filter_range() {
        let values = normalize_filter(&[0.2, -0.4, 0.05, 0.9]);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!((min, max), (0.0, 1.0));
    }
}

// ============================================================================
// Rendering Tests
// ============================================================================

mod render_tests {
    use super::*;

    #[test]
    fn test_constant_filter_is_mid_grey() {
        let weights = WeightTensor::new(3, 1, 2, vec![0.7; 18]).unwrap();
        let img = render_weights(&weights, 3).unwrap();

        let layout = GridLayout::new(3, 2, 3);
        assert_eq!(img.dimensions(), (layout.width(), layout.height()));
        assert_eq!(*img.get_pixel(CELL_PADDING, CELL_PADDING), Rgb([127, 127, 127]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_fixture_layers() {
        let config = load_config("config/network.json").unwrap();
        let params = load_parameters("config/parameters_small.json").unwrap();
        let out = tempdir().unwrap();

        let first = visualize_layer(&config, &params, 1, 5, out.path()).unwrap().unwrap();
        assert!(first.ends_with("weights1.png"));
        let img = image::open(&first).unwrap();
        // 4 filters -> 2x2 cells of 3*5 + 4 pixels
        assert_eq!((img.width(), img.height()), (38, 38));

        // f2 == 1
        assert!(visualize_layer(&config, &params, 2, 5, out.path()).unwrap().is_none());
        assert!(!out.path().join("weights2.png").exists());

        let third = visualize_layer(&config, &params, 3, 2, out.path()).unwrap().unwrap();
        let img = image::open(&third).unwrap();
        // 2 filters -> 1 row, 2 cols of 3*2 + 4
        assert_eq!((img.width(), img.height()), (20, 10));
    }
}
