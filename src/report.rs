//! Text reports for diffing oracle output against kernel traces.
//!
//! One line per output position, 1-based, row first:
//!
//! ```text
//! 1:1 = 0.406, 0.419, 0.598
//! 1:2 = 0.442, 0.685, 0.528
//! ```

use crate::error::{require_len, Result};
use crate::layers::FeatureMap;
use std::io::{self, Write};

/// Join values with `", "` using `precision` decimals.
pub fn format_values(values: &[f64], precision: usize) -> String {
    values
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"<row>:<col> = v0, v1, ..."` for every position of `map`.
pub fn format_rows(map: &FeatureMap, precision: usize) -> Vec<String> {
    map.positions()
        .map(|(x, y, values)| format!("{}:{} = {}", y + 1, x + 1, format_values(values, precision)))
        .collect()
}

/// Write a titled block of rows.
pub fn write_report<W: Write>(out: &mut W, title: &str, map: &FeatureMap, precision: usize) -> io::Result<()> {
    writeln!(out, "### {}", title)?;
    for line in format_rows(map, precision) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// One value that differs from the expected trace by more than the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub x: usize,
    pub y: usize,
    pub channel: usize,
    pub expected: f64,
    pub actual: f64,
}

impl Mismatch {
    pub fn describe(&self, precision: usize) -> String {
        format!(
            "{}:{} channel {}: expected {:.*}, got {:.*}",
            self.y + 1,
            self.x + 1,
            self.channel,
            precision,
            self.expected,
            precision,
            self.actual
        )
    }
}

/// Every position/channel where `|expected - actual| > tolerance`.
///
/// `expected` uses the same flat layout as `actual`; a length difference is an
/// error rather than a partial comparison.
pub fn compare(expected: &[f64], actual: &FeatureMap, tolerance: f64) -> Result<Vec<Mismatch>> {
    require_len("expected output", actual.as_slice().len(), expected.len())?;

    let channels = actual.channels();
    let width = actual.width();
    let mismatches = expected
        .iter()
        .zip(actual.as_slice())
        .enumerate()
        .filter(|(_, (e, a))| {
            // NaN on either side never counts as a match
            let diff = (*e - *a).abs();
            diff.is_nan() || diff > tolerance
        })
        .map(|(i, (&expected, &actual))| {
            let position = i / channels;
            Mismatch {
                x: position % width,
                y: position / width,
                channel: i % channels,
                expected,
                actual,
            }
        })
        .collect();
    Ok(mismatches)
}
