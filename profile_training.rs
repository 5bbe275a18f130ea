// profile_training.rs
// Runs the training program once without saving parameters and prints how
// long each OpenCL kernel took.
//
// Usage:
//   profile_training --epochs 100
//   profile_training --kernels

use anyhow::Result;
use clap::Parser;
use cnn_oracle::tools::profiler::profile;
use cnn_oracle::tools::{SystemRunner, TrainingCommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Profile a dry training run")]
struct Args {
    #[arg(long, default_value = "bin/cnn")]
    program: PathBuf,

    #[arg(long, short = 'c', default_value = "data/config.json")]
    config: PathBuf,

    #[arg(long, short = 'i', default_value = "data/train_samples")]
    input_dir: PathBuf,

    #[arg(long, default_value_t = 100)]
    epochs: usize,

    /// Ask the program for per-kernel timings
    #[arg(long)]
    kernels: bool,

    #[arg(long, default_value = "logs/profile.txt")]
    log: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let command = TrainingCommand {
        program: args.program,
        config: args.config,
        epochs: args.epochs,
        input_dir: args.input_dir,
        parameters: None,
        extra_args: if args.kernels { vec!["profile".to_string()] } else { Vec::new() },
    };
    println!("Command to execute:\n'{}'", command.profile_command_line());

    if let Some(dir) = args.log.parent() {
        fs::create_dir_all(dir)?;
    }
    let report = profile(&mut SystemRunner, &command, &args.log)?;
    let wall = report.wall_clock().as_secs_f64();
    println!(
        "Execution time: {:.3}s = {:.2}min ({:.5} s/epoch)",
        wall,
        wall / 60.0,
        wall / args.epochs.max(1) as f64
    );

    if args.kernels {
        for line in report.lines() {
            println!("{}", line);
        }
    }
    Ok(())
}
