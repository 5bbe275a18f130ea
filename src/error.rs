//! Error types shared by the oracle and the toolbox.
//!
//! Every fallible operation in the library returns [`Result<T>`]. Nothing is
//! recovered internally: callers decide whether to stop (oracle, scheduler)
//! or skip the current item (sample generator).

use std::path::PathBuf;

/// All error conditions the library reports.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Configuration values violate an invariant (even filter size, zero dimension, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A flat sequence does not have the length its declared shape requires.
    #[error("{name} has {actual} values, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Two shapes that must agree do not.
    #[error("shape mismatch for {name}: expected {expected}, got {actual}")]
    ShapeMismatch {
        name: &'static str,
        expected: String,
        actual: String,
    },

    /// Only layers 1, 2 and 3 exist.
    #[error("unknown layer {0}, only 1, 2 and 3 are valid")]
    UnknownLayer(usize),

    /// Source image cannot fit the requested crop.
    #[error("image '{}' is {width}x{height}, smaller than requested size {size}", path.display())]
    ImageTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        size: u32,
    },

    /// Duration strings look like `90m`, `12h` or `2d`.
    #[error("invalid duration '{0}', expected <number>[s|m|h|d|w]")]
    InvalidDuration(String),

    /// External process exited with a non-zero status (or was killed).
    #[error("command '{command}' failed with exit code {code:?}")]
    ProcessFailed { command: String, code: Option<i32> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, OracleError>;

/// Fails with [`OracleError::LengthMismatch`] unless `actual == expected`.
pub(crate) fn require_len(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(OracleError::LengthMismatch {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Product of `factors`, or [`OracleError::InvalidConfig`] when it overflows `usize`.
pub(crate) fn checked_product(name: &str, factors: &[usize]) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| OracleError::InvalidConfig(format!("{} {:?} overflows usize", name, factors)))
}
