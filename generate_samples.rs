// generate_samples.rs
// Builds training pairs from a directory of images: a random crop of the
// requested size and a degraded copy of that crop.
//
// Usage:
//   generate_samples -i data/org -o data/train_samples -s 550 -d 5

use anyhow::Result;
use clap::Parser;
use cnn_oracle::tools::samples::DEFAULT_DEGRADE_FACTOR;
use cnn_oracle::tools::SampleGenerator;
use cnn_oracle::utils::SimpleRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Create large/small training sample pairs")]
struct Args {
    /// Input directory
    #[arg(long, short = 'i')]
    in_dir: PathBuf,

    /// Output directory
    #[arg(long, short = 'o')]
    out_dir: PathBuf,

    /// Size of output images
    #[arg(long, short = 's')]
    out_size: u32,

    /// Scale factor used when producing the smaller image
    #[arg(long, short = 'd', default_value_t = DEFAULT_DEGRADE_FACTOR)]
    degrade_factor: f64,

    /// Crop seed, taken from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rng = match args.seed {
        Some(seed) => SimpleRng::new(seed),
        None => SimpleRng::from_time(),
    };
    let mut generator = SampleGenerator::new(args.out_size, args.degrade_factor, rng)?;
    let batch = generator.process_dir(&args.in_dir, &args.out_dir)?;

    for (path, err) in &batch.failures {
        println!("cannot create train samples for '{}': {}", path.display(), err);
    }
    if batch.created.is_empty() {
        println!("No files were created");
    } else {
        println!("created {} files", batch.file_count());
    }
    Ok(())
}
