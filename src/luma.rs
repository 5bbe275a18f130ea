//! Luma (Y of YCbCr) extraction, the single channel the network sees.

use crate::error::Result;
use image::{Rgb, RgbImage};
use std::path::Path;

/// ITU-R BT.601 weights for R, G and B.
pub const RGB_TO_LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Luma of one pixel on the 0..=255 scale.
pub fn luma(pixel: &Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0;
    RGB_TO_LUMA[0] * r as f64 + RGB_TO_LUMA[1] * g as f64 + RGB_TO_LUMA[2] * b as f64
}

/// Row-major luma values of the whole image, ready to be used as raw layer-1 input.
pub fn extract_luma(img: &RgbImage) -> Vec<f64> {
    img.pixels().map(luma).collect()
}

/// Luma channel of an image file along with its `(width, height)`.
pub fn load_luma(path: impl AsRef<Path>) -> Result<(Vec<f64>, u32, u32)> {
    let img = image::open(path.as_ref())?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok((extract_luma(&img), width, height))
}
