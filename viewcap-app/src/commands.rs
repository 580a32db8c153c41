//! Subcommand implementations.

use crate::Command;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use viewcap_capture::CaptureConfig;
use viewcap_data::{CropSpec, crop, load_camera_properties, load_rgb, sharpness};

pub fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Intrinsics { file } => intrinsics(&file),
        Command::Sharpness { images, crop } => rank_sharpness(&images, &crop.into()),
        Command::Crop { input, output, crop } => crop_file(&input, &output, &crop.into()),
        Command::CheckConfig { file } => check_config(&file),
    }
}

fn intrinsics(file: &Path) -> Result<(), Box<dyn Error>> {
    let properties = load_camera_properties(file)?;
    let fov = properties.fov_degrees();
    info!("Field of view: {:.2} x {:.2} degrees", fov.x, fov.y);
    println!("{}", properties.to_json_string()?);
    Ok(())
}

/// Score every image after cropping; returns them sharpest first.
pub fn score_images(images: &[PathBuf], spec: &CropSpec) -> Result<Vec<(PathBuf, f64)>, Box<dyn Error>> {
    spec.validate()?;
    let mut scores = Vec::with_capacity(images.len());
    for path in images {
        let image = crop(&load_rgb(path)?, spec)?;
        let score = sharpness(&image);
        info!("{}: {:.3}", path.display(), score);
        scores.push((path.clone(), score));
    }
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scores)
}

fn rank_sharpness(images: &[PathBuf], spec: &CropSpec) -> Result<(), Box<dyn Error>> {
    let scores = score_images(images, spec)?;
    for (path, score) in &scores {
        println!("{score:>12.3}  {}", path.display());
    }
    if let Some((path, score)) = scores.first() {
        println!("sharpest: {} ({score:.3})", path.display());
    }
    Ok(())
}

fn crop_file(input: &Path, output: &Path, spec: &CropSpec) -> Result<(), Box<dyn Error>> {
    spec.validate()?;
    let source = load_rgb(input)?;
    let cropped = crop(&source, spec)?;
    if spec.is_noop() {
        warn!("No crop target given, writing the image unchanged");
    }
    cropped.save(output)?;
    info!(
        "Cropped {}x{} to {}x{}, wrote {}",
        source.width(),
        source.height(),
        cropped.width(),
        cropped.height(),
        output.display()
    );
    Ok(())
}

fn check_config(file: &Path) -> Result<(), Box<dyn Error>> {
    let config = CaptureConfig::load(file)?;
    let kind = config.kind()?;
    info!("Capture configuration selects the {} backend", kind);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
