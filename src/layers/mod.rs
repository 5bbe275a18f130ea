//! Layer abstractions for the oracle
//!
//! This module provides the Layer trait, the convolution layer and the data
//! types it is built from: layer shape, weight/bias storage and feature maps.

mod r#trait;
pub mod conv2d;
pub mod feature_map;
pub mod layer_config;
pub mod weights;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub use conv2d::Conv2DLayer;
pub use feature_map::FeatureMap;
pub use layer_config::LayerConfig;
pub use weights::{weight_coord, weight_index, BiasVector, WeightCoord, WeightTensor};
