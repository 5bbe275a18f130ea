// forward_oracle.rs
// Recomputes layer 1 and layer 2 of the network for a JSON dataset and prints
// one "row:col = values" line per output position.
//
// Usage:
//   forward_oracle config/oracle_fixture.json
//   forward_oracle config/oracle_fixture.json --image data/sample_0_small.jpg
//
// With --image the luma channel of the image replaces the dataset input; the
// expected outputs of the dataset are then ignored.
// Exits with status 1 when the dataset carries expected outputs that differ.

use anyhow::{Context, Result};
use clap::Parser;
use cnn_oracle::dataset::load_dataset;
use cnn_oracle::luma::load_luma;
use cnn_oracle::oracle::ForwardOracle;
use cnn_oracle::report::write_report;
use log::{info, warn};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(about = "Reference forward pass of the first two network layers")]
struct Args {
    /// Oracle dataset (JSON)
    dataset: PathBuf,

    /// Take layer-1 input from the luma channel of this image
    #[arg(long)]
    image: Option<PathBuf>,

    /// Decimals printed for layer 1
    #[arg(long, default_value_t = 3)]
    precision: usize,

    /// Decimals printed for layer 2
    #[arg(long, default_value_t = 6)]
    layer2_precision: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut dataset = load_dataset(&args.dataset)
        .with_context(|| format!("failed to load dataset '{}'", args.dataset.display()))?;

    if let Some(image) = &args.image {
        let (luma, width, height) =
            load_luma(image).with_context(|| format!("failed to read image '{}'", image.display()))?;
        info!("using {}x{} luma of '{}' as input", width, height, image.display());
        dataset.layer1.input = luma;
        dataset.layer1.input_w = width as usize;
        dataset.layer1.input_h = height as usize;
        dataset.layer1.output = None;
        if let Some(layer2) = dataset.layer2.as_mut() {
            layer2.input = None;
            layer2.output = None;
        }
    }

    let output = ForwardOracle::run_dataset(&dataset)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, "LAYER 1", &output.layer1, args.precision)?;
    if let Some(layer2) = &output.layer2 {
        writeln!(out)?;
        write_report(&mut out, "LAYER 2", layer2, args.layer2_precision)?;
    }
    out.flush()?;

    let verification = output.verify(&dataset)?;
    if verification.checked_layers == 0 {
        return Ok(());
    }
    for m in verification.layer1.iter() {
        warn!("layer 1 {}", m.describe(args.precision));
    }
    for m in verification.layer2.iter() {
        warn!("layer 2 {}", m.describe(args.layer2_precision));
    }
    if verification.is_ok() {
        println!("\nAll {} checked layers match (tolerance {})", verification.checked_layers, dataset.tolerance);
        Ok(())
    } else {
        eprintln!(
            "{} mismatches in layer 1, {} in layer 2",
            verification.layer1.len(),
            verification.layer2.len()
        );
        process::exit(1);
    }
}
