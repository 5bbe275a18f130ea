//! Spatial grid of per-position channel vectors.

use crate::error::{checked_product, require_len, OracleError, Result};

/// `width × height` positions, each holding `channels` consecutive values.
///
/// Position `(x, y)` starts at `(y * width + x) * channels`, which is how the
/// kernels lay out every layer's input and output.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f64>,
}

impl FeatureMap {
    /// Wrap `data`, which must hold exactly `width * height * channels` values.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<f64>) -> Result<Self> {
        if channels == 0 {
            return Err(OracleError::InvalidConfig("feature map needs at least one channel".into()));
        }
        let expected = checked_product("feature map length", &[width, height, channels])?;
        require_len("feature map", expected, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width * height * channels],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "position ({}, {}) outside a {}x{} map",
            x,
            y,
            self.width,
            self.height
        );
        (y * self.width + x) * self.channels
    }

    /// Value of `channel` at `(x, y)`.
    pub fn get(&self, x: usize, y: usize, channel: usize) -> f64 {
        debug_assert!(channel < self.channels);
        self.data[self.offset(x, y) + channel]
    }

    /// All channels at `(x, y)`.
    pub fn position(&self, x: usize, y: usize) -> &[f64] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels]
    }

    pub fn position_mut(&mut self, x: usize, y: usize) -> &mut [f64] {
        let start = self.offset(x, y);
        &mut self.data[start..start + self.channels]
    }

    /// Positions in row-major order, `y` slower: `(x, y, values)`.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize, &[f64])> + '_ {
        let width = self.width;
        self.data
            .chunks_exact(self.channels)
            .enumerate()
            .map(move |(i, values)| (i % width, i / width, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_layout() {
        let data: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let map = FeatureMap::new(2, 2, 3, data).unwrap();

        assert_eq!(map.position(0, 0), &[0.0, 1.0, 2.0]);
        assert_eq!(map.position(1, 0), &[3.0, 4.0, 5.0]);
        assert_eq!(map.position(0, 1), &[6.0, 7.0, 8.0]);
        assert_eq!(map.get(1, 1, 2), 11.0);
    }

    #[test]
    fn test_positions_iterate_rows_first() {
        let map = FeatureMap::new(3, 2, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let coords: Vec<(usize, usize)> = map.positions().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(FeatureMap::new(5, 5, 1, vec![0.0; 24]).is_err());
    }

    #[test]
    fn test_position_mut() {
        let mut map = FeatureMap::zeros(2, 1, 2);
        map.position_mut(1, 0)[1] = 4.5;
        assert_eq!(map.as_slice(), &[0.0, 0.0, 0.0, 4.5]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_position_panics() {
        let map = FeatureMap::zeros(3, 3, 1);
        map.position(3, 0);
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        assert!(matches!(
            FeatureMap::new(usize::MAX, 2, 1, Vec::new()),
            Err(OracleError::InvalidConfig(_))
        ));
    }
}
