// visualize_weights.rs
// Draws the filters of every layer as grey-scale heatmaps.
//
// Usage:
//   visualize_weights data/config.json -o data -s 10
//   visualize_weights data/config.json -p data/parameters.json
//
// Output: weights1.png, weights2.png, weights3.png (layers with 1x1 filters
// are skipped).

use anyhow::{bail, Context, Result};
use clap::Parser;
use cnn_oracle::config::load_config;
use cnn_oracle::params::load_parameters;
use cnn_oracle::tools::heatmap::DEFAULT_SCALE;
use cnn_oracle::tools::visualize_layer;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Draw trained weights")]
struct Args {
    /// Network config file
    config: PathBuf,

    /// Parameters file, defaults to `parameters_file` of the config
    #[arg(long, short = 'p')]
    parameters_file: Option<PathBuf>,

    /// Where to store result images
    #[arg(long, short = 'o', default_value = ".")]
    out_dir: PathBuf,

    /// Pixels per weight
    #[arg(long, short = 's', default_value_t = DEFAULT_SCALE)]
    scale: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("failed to load config '{}'", args.config.display()))?;
    let parameters_file = match (&args.parameters_file, &config.parameters_file) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => PathBuf::from(path),
        (None, None) => bail!("either set parameters_file in the config or pass --parameters-file"),
    };
    println!("Parameter file: '{}'", parameters_file.display());
    let params = load_parameters(&parameters_file)
        .with_context(|| format!("failed to load parameters '{}'", parameters_file.display()))?;

    fs::create_dir_all(&args.out_dir)?;
    for layer in 1..=3 {
        match visualize_layer(&config, &params, layer, args.scale, &args.out_dir)? {
            Some(path) => println!("layer {} -> {}", layer, path.display()),
            None => println!("layer {}: 1x1 filters, skipped", layer),
        }
    }
    Ok(())
}
