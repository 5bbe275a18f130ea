//! Shape of a single convolution layer.

use crate::error::{checked_product, OracleError, Result};
use serde::{Deserialize, Serialize};

/// Dimensions of one convolution layer and of the input it consumes.
///
/// * `filter_size` - spatial size `f` of the square receptive field, always odd
/// * `input_channels` - `k`, the previous layer's filter count (1 for the luma input)
/// * `output_channels` - `n`, number of filters in this layer
/// * `input_width`, `input_height` - spatial size of the input feature map
///
/// The layer reads only valid windows, so the output grid is
/// `(input_width - f + 1) × (input_height - f + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub filter_size: usize,
    pub input_channels: usize,
    pub output_channels: usize,
    pub input_width: usize,
    pub input_height: usize,
}

impl LayerConfig {
    /// Build and validate a layer shape.
    pub fn new(
        filter_size: usize,
        input_channels: usize,
        output_channels: usize,
        input_width: usize,
        input_height: usize,
    ) -> Result<Self> {
        let config = Self {
            filter_size,
            input_channels,
            output_channels,
            input_width,
            input_height,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant of the shape.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("filter_size", self.filter_size),
            ("input_channels", self.input_channels),
            ("output_channels", self.output_channels),
            ("input_width", self.input_width),
            ("input_height", self.input_height),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(OracleError::InvalidConfig(format!("{} should be > 0", name)));
            }
        }
        if self.filter_size % 2 == 0 {
            return Err(OracleError::InvalidConfig(format!(
                "filter_size should be odd, got {}",
                self.filter_size
            )));
        }
        if self.filter_size > self.input_width || self.filter_size > self.input_height {
            return Err(OracleError::InvalidConfig(format!(
                "filter_size {} does not fit a {}x{} input, output grid would be empty",
                self.filter_size, self.input_width, self.input_height
            )));
        }
        let f = self.filter_size;
        checked_product("weight count", &[f, f, self.input_channels, self.output_channels])?;
        checked_product("input length", &[self.input_width, self.input_height, self.input_channels])?;
        checked_product("output length", &[self.output_width(), self.output_height(), self.output_channels])?;
        Ok(())
    }

    /// Shape of the layer that consumes this layer's output.
    ///
    /// The follower's input is this layer's output grid with `output_channels`
    /// channels, so two chained layers shrink the input by `f1 + f2 - 2`.
    pub fn next(&self, filter_size: usize, output_channels: usize) -> Result<Self> {
        if filter_size > self.output_width().min(self.output_height()) {
            return Err(OracleError::InvalidConfig(format!(
                "filter sizes {} + {} leave no output for a {}x{} input",
                self.filter_size, filter_size, self.input_width, self.input_height
            )));
        }
        Self::new(
            filter_size,
            self.output_channels,
            output_channels,
            self.output_width(),
            self.output_height(),
        )
    }

    /// Symmetric padding `f / 2` around the window centre.
    pub fn padding(&self) -> usize {
        self.filter_size / 2
    }

    /// Zero when the filter does not fit.
    pub fn output_width(&self) -> usize {
        self.input_width.checked_sub(self.filter_size).map_or(0, |d| d + 1)
    }

    pub fn output_height(&self) -> usize {
        self.input_height.checked_sub(self.filter_size).map_or(0, |d| d + 1)
    }

    /// `f * f * k * n`; [`LayerConfig::validate`] guarantees it fits `usize`.
    pub fn weight_count(&self) -> usize {
        self.filter_size * self.filter_size * self.input_channels * self.output_channels
    }

    /// Number of values in the flattened input.
    pub fn input_len(&self) -> usize {
        self.input_width * self.input_height * self.input_channels
    }

    /// Number of values in the flattened output.
    pub fn output_len(&self) -> usize {
        self.output_width() * self.output_height() * self.output_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layer_dimensions() {
        let config = LayerConfig::new(3, 1, 3, 5, 5).unwrap();

        assert_eq!(config.padding(), 1);
        assert_eq!(config.output_width(), 3);
        assert_eq!(config.output_height(), 3);
        assert_eq!(config.weight_count(), 27);
        assert_eq!(config.input_len(), 25);
        assert_eq!(config.output_len(), 27);
    }

    #[test]
    fn test_even_filter_rejected() {
        let err = LayerConfig::new(4, 1, 3, 9, 9).unwrap_err();
        assert!(err.to_string().contains("odd"));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(LayerConfig::new(3, 0, 3, 5, 5).is_err());
        assert!(LayerConfig::new(3, 1, 0, 5, 5).is_err());
        assert!(LayerConfig::new(3, 1, 3, 0, 5).is_err());
        assert!(LayerConfig::new(0, 1, 3, 5, 5).is_err());
    }

    #[test]
    fn test_filter_larger_than_input_rejected() {
        assert!(LayerConfig::new(7, 1, 3, 5, 9).is_err());
    }

    #[test]
    fn test_next_layer_shape() {
        let l1 = LayerConfig::new(3, 1, 3, 5, 5).unwrap();
        let l2 = l1.next(3, 2).unwrap();

        assert_eq!(l2.input_channels, 3);
        assert_eq!(l2.output_channels, 2);
        assert_eq!((l2.input_width, l2.input_height), (3, 3));
        assert_eq!((l2.output_width(), l2.output_height()), (1, 1));
        assert_eq!(l2.weight_count(), 54);
    }

    #[test]
    fn test_next_rejects_empty_grid() {
        let l1 = LayerConfig::new(3, 1, 3, 5, 5).unwrap();
        // 3 + 5 > 5 + 1
        assert!(matches!(l1.next(5, 2), Err(OracleError::InvalidConfig(_))));
    }

    #[test]
    fn test_next_huge_filter_is_config_error() {
        let l1 = LayerConfig::new(3, 1, 3, 5, 5).unwrap();
        assert!(matches!(l1.next(usize::MAX, 2), Err(OracleError::InvalidConfig(_))));
    }

    #[test]
    fn test_overflowing_sizes_rejected() {
        let err = LayerConfig::new(1, 1, usize::MAX, 2, 2).unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert!(matches!(
            LayerConfig::new(1, usize::MAX, 2, 3, 3),
            Err(OracleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_output_grid_of_unvalidated_shape() {
        let config = LayerConfig {
            filter_size: 9,
            input_channels: 1,
            output_channels: 1,
            input_width: 5,
            input_height: 5,
        };
        assert_eq!(config.output_width(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rectangular_input() {
        let config = LayerConfig::new(5, 1, 4, 12, 8).unwrap();
        assert_eq!(config.output_width(), 8);
        assert_eq!(config.output_height(), 4);
    }
}
