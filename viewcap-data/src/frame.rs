//! Frame types shared by every backend.

use crate::crop::{CropSpec, crop};
use crate::depth::{DEFAULT_DEPTH_ALPHA, scale_abs};
use crate::error::DataError;
use crate::sharpness::{laplacian_variance, sharpness};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use std::path::Path;
use tracing::debug;

/// Single-channel 16-bit depth samples (device units, usually millimetres).
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// A dense frame as produced by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    /// 3-channel color, RGB order.
    Color(RgbImage),
    /// 8-bit single channel (scaled depth, intensity).
    Gray(GrayImage),
    /// 16-bit depth samples.
    Depth(DepthImage),
}

impl RawFrame {
    /// Frame size as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            RawFrame::Color(image) => image.dimensions(),
            RawFrame::Gray(image) => image.dimensions(),
            RawFrame::Depth(image) => image.dimensions(),
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            RawFrame::Color(_) => 3,
            RawFrame::Gray(_) | RawFrame::Depth(_) => 1,
        }
    }

    /// Crop the frame, keeping its variant.
    pub fn crop(&self, spec: &CropSpec) -> Result<RawFrame, DataError> {
        Ok(match self {
            RawFrame::Color(image) => RawFrame::Color(crop(image, spec)?),
            RawFrame::Gray(image) => RawFrame::Gray(crop(image, spec)?),
            RawFrame::Depth(image) => RawFrame::Depth(crop(image, spec)?),
        })
    }

    /// Focus score of the frame. Depth is scored on its 8-bit scaled rendering.
    pub fn sharpness(&self) -> f64 {
        match self {
            RawFrame::Color(image) => sharpness(image),
            RawFrame::Gray(image) => laplacian_variance(image),
            RawFrame::Depth(image) => laplacian_variance(&scale_abs(image, DEFAULT_DEPTH_ALPHA)),
        }
    }

    pub fn as_color(&self) -> Option<&RgbImage> {
        match self {
            RawFrame::Color(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_depth(&self) -> Option<&DepthImage> {
        match self {
            RawFrame::Depth(image) => Some(image),
            _ => None,
        }
    }
}

impl From<RgbImage> for RawFrame {
    fn from(image: RgbImage) -> Self {
        RawFrame::Color(image)
    }
}

impl From<GrayImage> for RawFrame {
    fn from(image: GrayImage) -> Self {
        RawFrame::Gray(image)
    }
}

impl From<DepthImage> for RawFrame {
    fn from(image: DepthImage) -> Self {
        RawFrame::Depth(image)
    }
}

/// Load an image file as an RGB frame.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, DataError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }
    let image = image::open(path)?.to_rgb8();
    debug!("Loaded {}x{} image", image.width(), image.height());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_frame_dimensions_and_channels() {
        let color = RawFrame::from(RgbImage::new(4, 3));
        assert_eq!(color.dimensions(), (4, 3));
        assert_eq!(color.channels(), 3);

        let depth = RawFrame::from(DepthImage::new(7, 2));
        assert_eq!(depth.dimensions(), (7, 2));
        assert_eq!(depth.channels(), 1);
    }

    #[test]
    fn test_frame_crop_keeps_variant() {
        let depth = RawFrame::from(DepthImage::from_pixel(10, 10, Luma([500])));
        let cropped = depth.crop(&CropSpec::new(Some(4), Some(6))).unwrap();
        assert_eq!(cropped.dimensions(), (6, 4));
        assert_eq!(cropped.as_depth().unwrap().get_pixel(0, 0)[0], 500);
    }

    #[test]
    fn test_load_rgb_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let image = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 7]));
        image.save(&path).unwrap();

        let loaded = load_rgb(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_load_rgb_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rgb(dir.path().join("missing.png")).unwrap_err();
        assert!(err.is_not_found());
    }
}
