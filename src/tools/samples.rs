//! Training sample generation.
//!
//! Each source image yields one pair: a random `size × size` crop (the target)
//! and the same crop degraded by downscaling and upscaling back (the input).

use crate::error::{OracleError, Result};
use crate::utils::SimpleRng;
use image::imageops::FilterType;
use image::RgbImage;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Default ratio between the sample size and the degraded intermediate size.
pub const DEFAULT_DEGRADE_FACTOR: f64 = 2.0;

/// Paths of one created sample pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePair {
    pub id: usize,
    pub large: PathBuf,
    pub small: PathBuf,
}

/// Outcome of a directory batch.
#[derive(Debug, Default)]
pub struct SampleBatch {
    pub created: Vec<SamplePair>,
    pub failures: Vec<(PathBuf, OracleError)>,
}

impl SampleBatch {
    pub fn file_count(&self) -> usize {
        self.created.len() * 2
    }
}

/// Downscale `img` by `factor` (at least one pixel) and scale it back up.
pub fn degrade(img: &RgbImage, factor: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let small_w = ((width as f64 / factor) as u32).max(1);
    let small_h = ((height as f64 / factor) as u32).max(1);
    let small = image::imageops::resize(img, small_w, small_h, FilterType::Lanczos3);
    image::imageops::resize(&small, width, height, FilterType::Lanczos3)
}

/// Crops and degrades images, numbering pairs from an internal counter.
///
/// The counter only advances when a pair is written, so ids stay contiguous
/// even when some inputs are skipped.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    size: u32,
    degrade_factor: f64,
    next_id: usize,
    rng: SimpleRng,
}

impl SampleGenerator {
    pub fn new(size: u32, degrade_factor: f64, rng: SimpleRng) -> Result<Self> {
        if size == 0 {
            return Err(OracleError::InvalidConfig("sample size should be > 0".into()));
        }
        if degrade_factor.is_nan() || degrade_factor < 1.0 {
            return Err(OracleError::InvalidConfig(format!(
                "degrade factor should be >= 1, got {}",
                degrade_factor
            )));
        }
        Ok(Self {
            size,
            degrade_factor,
            next_id: 0,
            rng,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn degrade_factor(&self) -> f64 {
        self.degrade_factor
    }

    /// Id the next written pair will get.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    /// Random `size × size` crop of `img`.
    pub fn crop(&mut self, img: &RgbImage) -> Option<RgbImage> {
        let (width, height) = img.dimensions();
        if width < self.size || height < self.size {
            return None;
        }
        let x = self.rng.gen_inclusive_u32(width - self.size);
        let y = self.rng.gen_inclusive_u32(height - self.size);
        Some(image::imageops::crop_imm(img, x, y, self.size, self.size).to_image())
    }

    /// Write one pair for the image at `path` into `out_dir`.
    pub fn process_image(&mut self, path: &Path, out_dir: &Path) -> Result<SamplePair> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        let large = self.crop(&img).ok_or_else(|| OracleError::ImageTooSmall {
            path: path.to_path_buf(),
            width,
            height,
            size: self.size,
        })?;
        let small = degrade(&large, self.degrade_factor);

        let id = self.next_id;
        let large_path = out_dir.join(format!("sample_{}_large.jpg", id));
        let small_path = out_dir.join(format!("sample_{}_small.jpg", id));
        large.save(&large_path)?;
        if let Err(err) = small.save(&small_path) {
            // a pair is written whole or not at all
            if let Err(cleanup) = fs::remove_file(&large_path) {
                warn!("cannot remove '{}': {}", large_path.display(), cleanup);
            }
            return Err(err.into());
        }
        self.next_id += 1;

        Ok(SamplePair {
            id,
            large: large_path,
            small: small_path,
        })
    }

    /// Process every regular file of `in_dir` in name order.
    ///
    /// Files that fail (not an image, too small) are recorded and skipped.
    pub fn process_dir(&mut self, in_dir: &Path, out_dir: &Path) -> Result<SampleBatch> {
        fs::create_dir_all(out_dir)?;
        let mut files = Vec::new();
        for entry in fs::read_dir(in_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let mut batch = SampleBatch::default();
        for path in files {
            match self.process_image(&path, out_dir) {
                Ok(pair) => batch.created.push(pair),
                Err(err) => {
                    warn!("cannot create train samples for '{}': {}", path.display(), err);
                    batch.failures.push((path, err));
                }
            }
        }

        if batch.created.is_empty() {
            warn!("no files were created");
        } else {
            info!("created {} files", batch.file_count());
        }
        Ok(batch)
    }
}
