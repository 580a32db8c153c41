//! Viewcap command-line tool
//!
//! Offline access to the stateless capture utilities:
//! - Derive camera intrinsics from a property file
//! - Rank candidate images by sharpness
//! - Crop an image with the capture crop rules
//! - Validate a capture backend configuration

mod commands;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use viewcap_data::CropSpec;

/// Viewcap - capture utilities for multi-view reconstruction
#[derive(Parser, Debug)]
#[command(name = "viewcap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a camera property file and print the derived record
    Intrinsics {
        file: PathBuf,
    },
    /// Score images by Laplacian variance and report the sharpest
    Sharpness {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[command(flatten)]
        crop: CropArgs,
    },
    /// Crop an image and write the result
    Crop {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        crop: CropArgs,
    },
    /// Load a capture configuration and print it with defaults filled in
    CheckConfig {
        file: PathBuf,
    },
}

#[derive(ClapArgs, Debug, Clone, Copy)]
struct CropArgs {
    /// Target width in pixels
    #[arg(long, allow_negative_numbers = true)]
    crop_width: Option<i64>,

    /// Target height in pixels
    #[arg(long, allow_negative_numbers = true)]
    crop_height: Option<i64>,

    /// Horizontal window shift
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset_x: i64,

    /// Vertical window shift
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset_y: i64,
}

impl From<CropArgs> for CropSpec {
    fn from(args: CropArgs) -> Self {
        CropSpec::new(args.crop_height, args.crop_width).with_offset(args.offset_x, args.offset_y)
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = commands::run(args.command) {
        eprintln!("viewcap error: {}", e);
        std::process::exit(1);
    }
}
