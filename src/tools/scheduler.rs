//! Long-running training scheduler.
//!
//! Splits an epoch budget into fixed-size iterations and launches the external
//! training program once per iteration. Each run's stdout and stderr go to a
//! timestamped log; after a successful run the parameters file is archived
//! next to it. The first non-zero exit stops the loop.

use crate::error::{OracleError, Result};
use chrono::Local;
use log::{error, info};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_EPOCHS_PER_ITERATION: usize = 500;

/// Measured on the reference machine.
pub const DEFAULT_SECONDS_PER_EPOCH: f64 = 0.8;

/// Parse `X[s|m|h|d|w]`, e.g. `90m` or `2d`.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || OracleError::InvalidDuration(text.to_string());
    let text = text.trim();
    let unit = text.chars().last().ok_or_else(invalid)?;
    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        'w' => 604_800,
        _ => return Err(invalid()),
    };
    let amount: u64 = text[..text.len() - 1].parse().map_err(|_| invalid())?;
    Ok(Duration::from_secs(amount * seconds_per_unit))
}

fn check_seconds_per_epoch(seconds_per_epoch: f64) -> Result<f64> {
    if !seconds_per_epoch.is_finite() || seconds_per_epoch <= 0.0 {
        return Err(OracleError::InvalidConfig(format!(
            "seconds per epoch should be a positive number, got {}",
            seconds_per_epoch
        )));
    }
    Ok(seconds_per_epoch)
}

/// Epochs that fit in `duration` at `seconds_per_epoch`.
pub fn epochs_for_duration(duration: Duration, seconds_per_epoch: f64) -> Result<usize> {
    Ok((duration.as_secs_f64() / check_seconds_per_epoch(seconds_per_epoch)?) as usize)
}

/// Invocation of the training program.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingCommand {
    pub program: PathBuf,
    pub config: PathBuf,
    pub epochs: usize,
    pub input_dir: PathBuf,
    /// Where the program writes parameters; `None` runs it `dry`
    pub parameters: Option<PathBuf>,
    /// Extra trailing arguments (`profile` for kernel timings)
    pub extra_args: Vec<String>,
}

impl TrainingCommand {
    fn template_args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.config.display().to_string(),
            "--epochs".to_string(),
            self.epochs.to_string(),
            "-i".to_string(),
            self.input_dir.display().to_string(),
        ]
    }

    /// `train -c <config> --epochs <N> -i <dir>` followed by `-o <file>` or `dry`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["train".to_string()];
        args.extend(self.template_args());
        match &self.parameters {
            Some(path) => {
                args.push("-o".to_string());
                args.push(path.display().to_string());
            }
            None => args.push("dry".to_string()),
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Profiling layout: `train dry -c <config> --epochs <N> -i <dir>` plus the
    /// extra arguments. Always dry, `parameters` is ignored.
    pub fn profile_args(&self) -> Vec<String> {
        let mut args = vec!["train".to_string(), "dry".to_string()];
        args.extend(self.template_args());
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Whole command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        Self::join(&self.program, self.args())
    }

    pub fn profile_command_line(&self) -> String {
        Self::join(&self.program, self.profile_args())
    }

    fn join(program: &Path, args: Vec<String>) -> String {
        let mut parts = vec![program.display().to_string()];
        parts.extend(args);
        parts.join(" ")
    }
}

/// Launches a program and reports its exit code (`None` if killed by a signal).
pub trait ProcessRunner {
    fn run(&mut self, program: &Path, args: &[String], log_path: &Path) -> Result<Option<i32>>;
}

/// Runs the real process with stdout and stderr redirected into the log file.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, program: &Path, args: &[String], log_path: &Path) -> Result<Option<i32>> {
        let log = File::create(log_path)?;
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log))
            .status()?;
        Ok(status.code())
    }
}

/// How the epoch budget splits into iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationPlan {
    pub iterations: usize,
    pub epochs_per_iteration: usize,
}

impl IterationPlan {
    /// Every iteration runs the same number of epochs, so the remainder of
    /// `total_epochs` is dropped. The budget is at least one epoch.
    pub fn new(total_epochs: usize, epochs_per_iteration: usize) -> Result<Self> {
        if epochs_per_iteration == 0 {
            return Err(OracleError::InvalidConfig(
                "epochs per iteration should be > 0".into(),
            ));
        }
        let total = total_epochs.max(1);
        Ok(Self {
            iterations: total / epochs_per_iteration,
            epochs_per_iteration,
        })
    }

    pub fn total_epochs(&self) -> usize {
        self.iterations * self.epochs_per_iteration
    }

    /// Saturates instead of panicking: a negative or NaN rate gives zero.
    pub fn estimated_time(&self, seconds_per_epoch: f64) -> Duration {
        let seconds = (self.total_epochs() as f64 * seconds_per_epoch).max(0.0);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

/// Result of a completed schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub iterations: usize,
    pub logs: Vec<PathBuf>,
    pub archived_parameters: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Runs a [`TrainingCommand`] according to an [`IterationPlan`].
pub struct TrainingScheduler<R: ProcessRunner> {
    command: TrainingCommand,
    plan: IterationPlan,
    log_dir: PathBuf,
    seconds_per_epoch: f64,
    runner: R,
}

impl<R: ProcessRunner> TrainingScheduler<R> {
    /// `command.epochs` is overwritten with the plan's epochs per iteration.
    pub fn new(mut command: TrainingCommand, plan: IterationPlan, log_dir: impl Into<PathBuf>, runner: R) -> Self {
        command.epochs = plan.epochs_per_iteration;
        Self {
            command,
            plan,
            log_dir: log_dir.into(),
            seconds_per_epoch: DEFAULT_SECONDS_PER_EPOCH,
            runner,
        }
    }

    /// Rate used for the time estimates; must be finite and positive.
    pub fn with_seconds_per_epoch(mut self, seconds_per_epoch: f64) -> Result<Self> {
        self.seconds_per_epoch = check_seconds_per_epoch(seconds_per_epoch)?;
        Ok(self)
    }

    pub fn command(&self) -> &TrainingCommand {
        &self.command
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d--%H-%M-%S").to_string()
    }

    /// Run every iteration. Stops at the first failed run and returns
    /// [`OracleError::ProcessFailed`]; logs and archives already written stay.
    pub fn run(&mut self) -> Result<ScheduleSummary> {
        fs::create_dir_all(&self.log_dir)?;
        let start = Instant::now();
        let command_line = self.command.command_line();
        let args = self.command.args();
        info!("command to execute: '{}'", command_line);
        info!(
            "will do {} iterations, {} epochs per iteration = {} total (estimated {}s)",
            self.plan.iterations,
            self.plan.epochs_per_iteration,
            self.plan.total_epochs(),
            self.plan.estimated_time(self.seconds_per_epoch).as_secs()
        );

        let mut summary = ScheduleSummary {
            iterations: 0,
            logs: Vec::new(),
            archived_parameters: Vec::new(),
            elapsed: Duration::ZERO,
        };

        for i in 0..self.plan.iterations {
            let stamp = Self::timestamp();
            let log_path = self.log_dir.join(format!("log_{}_{:03}.txt", stamp, i + 1));
            let epochs_left = (self.plan.iterations - i) * self.plan.epochs_per_iteration;
            info!(
                "---- {} - {} (time left: {}min) ----",
                i + 1,
                stamp,
                (epochs_left as f64 * self.seconds_per_epoch) as u64 / 60
            );

            let code = self.runner.run(&self.command.program, &args, &log_path)?;
            summary.logs.push(log_path);
            info!("return code: {:?}", code);
            if code != Some(0) {
                error!("---- FAIL ---- '{}' exited with {:?}", command_line, code);
                return Err(OracleError::ProcessFailed {
                    command: command_line,
                    code,
                });
            }

            if let Some(parameters) = &self.command.parameters {
                let archive = self.log_dir.join(format!("parameters_{}_{:03}.json", stamp, i + 1));
                info!("saving sub results to: '{}'", archive.display());
                fs::copy(parameters, &archive)?;
                summary.archived_parameters.push(archive);
            }
            summary.iterations += 1;
        }

        summary.elapsed = start.elapsed();
        let total = self.plan.total_epochs().max(1);
        info!(
            "execution time: {:.3}s = {:.2}min ({:.5} s/epoch)",
            summary.elapsed.as_secs_f64(),
            summary.elapsed.as_secs_f64() / 60.0,
            summary.elapsed.as_secs_f64() / total as f64
        );
        Ok(summary)
    }
}
