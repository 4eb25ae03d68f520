//! Face-detection demo
//!
//! Loads the res10 SSD face network once, then outlines every face found in
//! each frame handed to `doOpenCvTask`.
//!
//! Usage: cargo run -p demos --bin facedetect -- --prototxt deploy.prototxt \
//!            --weights res10_300x300_ssd_iter_140000_fp16.caffemodel --source 0

mod harness;

use anyhow::{Context, Result};
use clap::Parser;
use framecv_detect::{DetectorConfig, FaceNet};
use framecv_host::FaceBoxTask;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Outline faces in a live frame stream")]
struct CliArgs {
    /// JSON detector configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Network topology (Caffe prototxt)
    #[arg(long)]
    prototxt: Option<PathBuf>,

    /// Network weights (Caffe binary)
    #[arg(long)]
    weights: Option<PathBuf>,

    #[command(flatten)]
    harness: harness::HarnessArgs,
}

fn load_config(args: &CliArgs) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(prototxt) = &args.prototxt {
        config.prototxt = prototxt.clone();
    }
    if let Some(weights) = &args.weights {
        config.weights = weights.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    harness::init_logging();
    let args = CliArgs::parse();

    let config = load_config(&args)?;
    let net = FaceNet::load(&config).context("Failed to initialize face detector")?;
    info!("face network ready ({} + {})", config.prototxt.display(), config.weights.display());

    harness::run(&args.harness, "framecv facedetect", FaceBoxTask::new(net), 0)
}
