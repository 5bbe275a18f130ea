//! Flat weight and bias storage with the kernels' memory layout.
//!
//! The external kernels read weights from one contiguous buffer ordered by
//! `(dy, dx, input_channel, output_channel)`, output channel fastest:
//!
//! ```text
//! index = ((dy * f + dx) * k + input_channel) * n + output_channel
//! ```
//!
//! [`WeightTensor`] keeps exactly that buffer and exposes typed accessors over
//! it, so interop with kernel traces is a plain copy of the vector.

use crate::config::ParametersDistribution;
use crate::error::{checked_product, require_len, Result};
use crate::layers::LayerConfig;
use crate::utils::SimpleRng;

/// Coordinates of one weight inside a [`WeightTensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightCoord {
    pub dy: usize,
    pub dx: usize,
    pub input_channel: usize,
    pub output_channel: usize,
}

/// Flat index of a weight for a layer with filter size `f`, `k` input and `n` output channels.
pub fn weight_index(filter_size: usize, input_channels: usize, output_channels: usize, c: WeightCoord) -> usize {
    ((c.dy * filter_size + c.dx) * input_channels + c.input_channel) * output_channels + c.output_channel
}

/// Inverse of [`weight_index`].
pub fn weight_coord(filter_size: usize, input_channels: usize, output_channels: usize, index: usize) -> WeightCoord {
    let output_channel = index % output_channels;
    let rest = index / output_channels;
    let input_channel = rest % input_channels;
    let cell = rest / input_channels;
    WeightCoord {
        dy: cell / filter_size,
        dx: cell % filter_size,
        input_channel,
        output_channel,
    }
}

/// Convolution weights of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTensor {
    filter_size: usize,
    input_channels: usize,
    output_channels: usize,
    data: Vec<f64>,
}

impl WeightTensor {
    /// Wrap `data`, which must hold exactly `f * f * k * n` values.
    pub fn new(filter_size: usize, input_channels: usize, output_channels: usize, data: Vec<f64>) -> Result<Self> {
        let expected = checked_product(
            "weight count",
            &[filter_size, filter_size, input_channels, output_channels],
        )?;
        require_len("weights", expected, data.len())?;
        Ok(Self {
            filter_size,
            input_channels,
            output_channels,
            data,
        })
    }

    /// Weights sized for `config`.
    pub fn for_layer(config: &LayerConfig, data: Vec<f64>) -> Result<Self> {
        Self::new(config.filter_size, config.input_channels, config.output_channels, data)
    }

    /// Weights drawn from a normal distribution (`mean_w`, `sd_w`).
    pub fn from_distribution(
        filter_size: usize,
        input_channels: usize,
        output_channels: usize,
        distribution: &ParametersDistribution,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        let count = checked_product(
            "weight count",
            &[filter_size, filter_size, input_channels, output_channels],
        )?;
        let data = (0..count)
            .map(|_| rng.next_gaussian(distribution.mean_w, distribution.std_deviation_w))
            .collect();
        Ok(Self {
            filter_size,
            input_channels,
            output_channels,
            data,
        })
    }

    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Flat index of `(dy, dx, input_channel, output_channel)`.
    pub fn index(&self, dy: usize, dx: usize, input_channel: usize, output_channel: usize) -> usize {
        weight_index(
            self.filter_size,
            self.input_channels,
            self.output_channels,
            WeightCoord {
                dy,
                dx,
                input_channel,
                output_channel,
            },
        )
    }

    /// Weight at the given coordinates. Panics when a coordinate is out of range.
    pub fn weight_at(&self, dy: usize, dx: usize, input_channel: usize, output_channel: usize) -> f64 {
        assert!(
            dy < self.filter_size
                && dx < self.filter_size
                && input_channel < self.input_channels
                && output_channel < self.output_channels,
            "weight ({}, {}, {}, {}) outside a {}x{}x{}x{} tensor",
            dy,
            dx,
            input_channel,
            output_channel,
            self.filter_size,
            self.filter_size,
            self.input_channels,
            self.output_channels
        );
        self.data[self.index(dy, dx, input_channel, output_channel)]
    }

    /// Checked variant of [`weight_at`](Self::weight_at).
    pub fn get(&self, coord: WeightCoord) -> Option<f64> {
        if coord.dy >= self.filter_size
            || coord.dx >= self.filter_size
            || coord.input_channel >= self.input_channels
            || coord.output_channel >= self.output_channels
        {
            return None;
        }
        self.data
            .get(weight_index(self.filter_size, self.input_channels, self.output_channels, coord))
            .copied()
    }

    /// Coordinates of the weight stored at flat `index`, `None` past the end.
    pub fn coords(&self, index: usize) -> Option<WeightCoord> {
        if index >= self.data.len() {
            return None;
        }
        Some(weight_coord(self.filter_size, self.input_channels, self.output_channels, index))
    }

    /// The `f × f` kernel connecting one input channel to one output channel, row-major.
    pub fn filter(&self, input_channel: usize, output_channel: usize) -> Vec<f64> {
        let f = self.filter_size;
        let mut values = Vec::with_capacity(f * f);
        for dy in 0..f {
            for dx in 0..f {
                values.push(self.weight_at(dy, dx, input_channel, output_channel));
            }
        }
        values
    }
}

/// One bias per output channel.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasVector {
    data: Vec<f64>,
}

impl BiasVector {
    /// Wrap `data`, which must hold exactly `output_channels` values.
    pub fn new(output_channels: usize, data: Vec<f64>) -> Result<Self> {
        require_len("bias", output_channels, data.len())?;
        Ok(Self { data })
    }

    /// Biases drawn from a normal distribution (`mean_b`, `sd_b`).
    pub fn from_distribution(output_channels: usize, distribution: &ParametersDistribution, rng: &mut SimpleRng) -> Self {
        let data = (0..output_channels)
            .map(|_| rng.next_gaussian(distribution.mean_b, distribution.std_deviation_b))
            .collect();
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, output_channel: usize) -> f64 {
        self.data[output_channel]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}
