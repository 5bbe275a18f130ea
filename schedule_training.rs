// schedule_training.rs
// Runs the training program for a long time, split into fixed-size iterations.
// Each iteration's output goes to logs/log_<timestamp>_<iter>.txt and the
// parameters file is archived next to it after every successful iteration.
//
// Usage:
//   schedule_training 2d
//   schedule_training 90m --program bin/cnn --config data/config.json --dry

use anyhow::{Context, Result};
use clap::Parser;
use cnn_oracle::tools::scheduler::{
    epochs_for_duration, parse_duration, DEFAULT_EPOCHS_PER_ITERATION, DEFAULT_SECONDS_PER_EPOCH,
};
use cnn_oracle::tools::{IterationPlan, SystemRunner, TrainingCommand, TrainingScheduler};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Run training in iterations for a given amount of time")]
struct Args {
    /// How long to train, e.g. 45s, 90m, 12h, 2d, 1w
    duration: String,

    #[arg(long, default_value = "bin/cnn")]
    program: PathBuf,

    #[arg(long, short = 'c', default_value = "data/config.json")]
    config: PathBuf,

    #[arg(long, short = 'i', default_value = "data/train_samples")]
    input_dir: PathBuf,

    #[arg(long, short = 'o', default_value = "data/parameters.json")]
    parameters: PathBuf,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_EPOCHS_PER_ITERATION)]
    epochs_per_iteration: usize,

    #[arg(long, default_value_t = DEFAULT_SECONDS_PER_EPOCH)]
    seconds_per_epoch: f64,

    /// Do not write or archive parameters
    #[arg(long)]
    dry: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let duration = parse_duration(&args.duration)?;
    let epochs = epochs_for_duration(duration, args.seconds_per_epoch)?;
    let plan = IterationPlan::new(epochs, args.epochs_per_iteration)?;
    println!(
        "Training for {}s: {} iterations of {} epochs",
        duration.as_secs(),
        plan.iterations,
        plan.epochs_per_iteration
    );

    let command = TrainingCommand {
        program: args.program,
        config: args.config,
        epochs: plan.epochs_per_iteration,
        input_dir: args.input_dir,
        parameters: (!args.dry).then_some(args.parameters),
        extra_args: Vec::new(),
    };

    let mut scheduler = TrainingScheduler::new(command, plan, &args.log_dir, SystemRunner)
        .with_seconds_per_epoch(args.seconds_per_epoch)?;
    let summary = scheduler
        .run()
        .with_context(|| format!("training stopped, logs are in '{}'", args.log_dir.display()))?;

    println!(
        "Finished {} iterations in {:.2}min, {} parameter snapshots archived",
        summary.iterations,
        summary.elapsed.as_secs_f64() / 60.0,
        summary.archived_parameters.len()
    );
    Ok(())
}
