//! Brightness demo
//!
//! Shifts every channel of each frame by `level - 100`.
//!
//! Usage: cargo run -p demos --bin brightness -- --level 140 --source video.mp4

mod harness;

use anyhow::Result;
use clap::Parser;
use framecv_host::BrightnessTask;

#[derive(Parser, Debug)]
#[command(about = "Brighten or darken a live frame stream")]
struct CliArgs {
    /// Brightness level passed to the host call; 100 leaves frames unchanged
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    level: i32,

    #[command(flatten)]
    harness: harness::HarnessArgs,
}

fn main() -> Result<()> {
    harness::init_logging();
    let args = CliArgs::parse();
    harness::run(&args.harness, "framecv brightness", BrightnessTask, args.level)
}
