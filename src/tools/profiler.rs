//! Kernel timing profiler.
//!
//! Runs the training program once in dry mode and parses the per-kernel
//! timing lines it prints when `profile` is passed:
//!
//! ```text
//! Kernel 'src/kernels/layer_uber_kernel.cl --[-D CURRENT_FILTER_COUNT=32]' took 1234567ns (0.001235s)
//! ```

use crate::error::{OracleError, Result};
use crate::tools::scheduler::{ProcessRunner, TrainingCommand};
use log::{error, info, warn};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

pub const KERNEL_PROFILE_PATTERN: &str = r"Kernel '.*/(.*?\]).*?([\-e.\d]+)ns.*?([\-e.\d]+)s";

/// Characters removed from kernel names before printing.
const NAME_NOISE: [&str; 3] = ["-D ", "'", "[--]"];

#[derive(Debug, Clone, PartialEq)]
pub struct KernelTiming {
    pub name: String,
    pub nanoseconds: u64,
    pub seconds: f64,
}

/// Strip build flags noise from a captured kernel name.
pub fn clean_kernel_name(name: &str) -> String {
    NAME_NOISE
        .iter()
        .fold(name.to_string(), |acc, noise| acc.replace(noise, ""))
}

/// Every kernel timing in `output`, in order of appearance.
///
/// Lines whose numbers do not parse are skipped with a warning.
pub fn parse_kernel_timings(output: &str) -> Vec<KernelTiming> {
    // the pattern is a literal, compiling it cannot fail
    let re = Regex::new(KERNEL_PROFILE_PATTERN).expect("invalid kernel profile pattern");
    re.captures_iter(output)
        .filter_map(|caps| {
            let name = caps[1].to_string();
            let ns = caps[2].parse::<f64>();
            let s = caps[3].parse::<f64>();
            match (ns, s) {
                (Ok(ns), Ok(s)) => Some(KernelTiming {
                    name,
                    nanoseconds: ns as u64,
                    seconds: s,
                }),
                _ => {
                    warn!("could not parse timing of kernel '{}'", name);
                    None
                }
            }
        })
        .collect()
}

/// Kernel timings sorted by duration together with the run's wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    kernels: Vec<KernelTiming>,
    wall_clock: Duration,
}

impl ProfileReport {
    pub fn new(mut kernels: Vec<KernelTiming>, wall_clock: Duration) -> Self {
        kernels.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));
        Self { kernels, wall_clock }
    }

    /// Ascending by seconds.
    pub fn kernels(&self) -> &[KernelTiming] {
        &self.kernels
    }

    pub fn wall_clock(&self) -> Duration {
        self.wall_clock
    }

    pub fn kernel_seconds(&self) -> f64 {
        self.kernels.iter().map(|k| k.seconds).sum()
    }

    /// Percentage of total kernel time spent in `timing`.
    pub fn kernel_share(&self, timing: &KernelTiming) -> f64 {
        let total = self.kernel_seconds();
        if total > 0.0 {
            timing.seconds * 100.0 / total
        } else {
            0.0
        }
    }

    /// Percentage of wall-clock time spent in kernels.
    pub fn wall_clock_share(&self) -> f64 {
        let wall = self.wall_clock.as_secs_f64();
        if wall > 0.0 {
            self.kernel_seconds() * 100.0 / wall
        } else {
            0.0
        }
    }

    /// One line per kernel plus the two totals.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .kernels
            .iter()
            .map(|k| {
                format!(
                    "{:7.4}s ({:5.2}%)- {:.65}",
                    k.seconds,
                    self.kernel_share(k),
                    clean_kernel_name(&k.name)
                )
            })
            .collect();
        lines.push(format!("Time spend in kernel: {:.6}s", self.kernel_seconds()));
        lines.push(format!(
            "Percent of time spend in kernel: {:.4}%",
            self.wall_clock_share()
        ));
        lines
    }
}

/// Run `command` once in dry mode (`train dry ...`), its output captured in
/// `log_path`, and build the report.
pub fn profile<R: ProcessRunner>(runner: &mut R, command: &TrainingCommand, log_path: &Path) -> Result<ProfileReport> {
    let command_line = command.profile_command_line();
    info!("command to execute: '{}'", command_line);

    let start = Instant::now();
    let code = runner.run(&command.program, &command.profile_args(), log_path)?;
    let elapsed = start.elapsed();
    if code != Some(0) {
        error!("---- FAIL ---- '{}' exited with {:?}", command_line, code);
        return Err(OracleError::ProcessFailed {
            command: command_line,
            code,
        });
    }

    let epochs = command.epochs.max(1) as f64;
    info!(
        "execution time: {:.3}s = {:.2}min ({:.5} s/epoch)",
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() / 60.0,
        elapsed.as_secs_f64() / epochs
    );

    let output = fs::read_to_string(log_path)?;
    let kernels = parse_kernel_timings(&output);
    if kernels.is_empty() {
        warn!("no kernel timings found in '{}'", log_path.display());
    }
    Ok(ProfileReport::new(kernels, elapsed))
}
