//! Grey-scale heatmaps of trained filters.
//!
//! Every `(output, input)` channel pair of a layer is drawn as one `f × f`
//! filter, each weight a `scale × scale` square, laid out in a near-square grid.

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::layers::WeightTensor;
use crate::params::NetworkParameters;
use image::{Rgb, RgbImage};
use log::info;
use std::path::{Path, PathBuf};

/// Border around each filter cell.
pub const CELL_PADDING: u32 = 2;

pub const DEFAULT_SCALE: u32 = 10;

/// Placement of `filters` cells of `f × f` weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub cell_size: u32,
}

impl GridLayout {
    pub fn new(filter_size: u32, filters: u32, scale: u32) -> Self {
        let rows = ((filters as f64).sqrt() as u32).max(1);
        Self {
            rows,
            cols: filters.div_ceil(rows),
            cell_size: filter_size * scale + 2 * CELL_PADDING,
        }
    }

    pub fn width(&self) -> u32 {
        self.cols * self.cell_size
    }

    pub fn height(&self) -> u32 {
        self.rows * self.cell_size
    }

    /// Top-left pixel of the first weight of cell `index`.
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let row = index / self.cols;
        let col = index % self.cols;
        (
            col * self.cell_size + CELL_PADDING,
            row * self.cell_size + CELL_PADDING,
        )
    }
}

/// Min-max normalise to `[0, 1]`; a constant filter maps to 0.5.
pub fn normalize_filter(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|&v| if max > min { (v - min) / (max - min) } else { 0.5 })
        .collect()
}

/// Draw all filters of `weights`, `None` for 1×1 filters which show nothing.
pub fn render_weights(weights: &WeightTensor, scale: u32) -> Option<RgbImage> {
    let f = weights.filter_size();
    let (k, n) = (weights.input_channels(), weights.output_channels());
    if f == 1 || n * k == 0 {
        return None;
    }

    let layout = GridLayout::new(f as u32, (n * k) as u32, scale);
    let mut img = RgbImage::new(layout.width(), layout.height());

    for out_c in 0..n {
        for in_c in 0..k {
            let (ox, oy) = layout.cell_origin((out_c * k + in_c) as u32);
            let filter = normalize_filter(&weights.filter(in_c, out_c));
            for (i, value) in filter.into_iter().enumerate() {
                let grey = (value * 255.0) as u8;
                let (dy, dx) = ((i / f) as u32, (i % f) as u32);
                for py in 0..scale {
                    for px in 0..scale {
                        img.put_pixel(ox + dx * scale + px, oy + dy * scale + py, Rgb([grey, grey, grey]));
                    }
                }
            }
        }
    }
    Some(img)
}

/// Render `layer` of `params` into `<out_dir>/weights<layer>.png`.
///
/// Returns the written path, or `None` when the layer has 1×1 filters.
pub fn visualize_layer(
    config: &NetworkConfig,
    params: &NetworkParameters,
    layer: usize,
    scale: u32,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let weights = params.weight_tensor(config, layer)?;
    let values = weights.as_slice();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    info!(
        "layer {}: f={}, k={}, n={}, min_w={}, max_w={}",
        layer,
        weights.filter_size(),
        weights.input_channels(),
        weights.output_channels(),
        min,
        max
    );

    let Some(img) = render_weights(&weights, scale) else {
        info!("layer {}: f==1, drawing weights would not show anything", layer);
        return Ok(None);
    };
    let path = out_dir.join(format!("weights{}.png", layer));
    img.save(&path)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_near_square() {
        let layout = GridLayout::new(3, 96, 10);
        assert_eq!((layout.rows, layout.cols), (9, 11));
        assert_eq!(layout.cell_size, 34);
        assert_eq!((layout.width(), layout.height()), (374, 306));

        let single = GridLayout::new(5, 1, 2);
        assert_eq!((single.rows, single.cols), (1, 1));
    }

    #[test]
    fn test_cell_origin() {
        let layout = GridLayout::new(3, 6, 1);
        // 2 rows x 3 cols, cells of 7 pixels
        assert_eq!(layout.cell_origin(0), (2, 2));
        assert_eq!(layout.cell_origin(2), (16, 2));
        assert_eq!(layout.cell_origin(4), (9, 9));
    }

    #[test]
    fn test_normalize_filter() {
        assert_eq!(normalize_filter(&[-1.0, 0.0, 3.0]), vec![0.0, 0.25, 1.0]);
        assert_eq!(normalize_filter(&[0.3, 0.3]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_render_skips_pointwise_filters() {
        let weights = WeightTensor::new(1, 2, 2, vec![0.0; 4]).unwrap();
        assert!(render_weights(&weights, 10).is_none());
    }

    #[test]
    fn test_render_paints_scaled_squares() {
        // one 3x3 filter: ramp 0..8
        let weights = WeightTensor::new(3, 1, 1, (0..9).map(|v| v as f64).collect()).unwrap();
        let img = render_weights(&weights, 2).unwrap();
        assert_eq!(img.dimensions(), (10, 10));

        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(2, 2), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(7, 7), Rgb([255, 255, 255]));
        // weight (dy=0, dx=1) = 1/8
        assert_eq!(img.get_pixel(4, 3).0[0], (255.0 / 8.0) as u8);
    }
}
