//! Depth sample conversion and visualization.

use crate::error::DataError;
use crate::frame::DepthImage;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Scale factor mapping millimetre depth into a viewable 8-bit range (~5 m full scale).
pub const DEFAULT_DEPTH_ALPHA: f64 = 0.05;

/// Scale each sample by `alpha`, take the absolute value and saturate to `u8`.
///
/// Rounds half to even, matching the usual `convertScaleAbs` behaviour.
pub fn scale_abs(depth: &DepthImage, alpha: f64) -> GrayImage {
    let (width, height) = depth.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let scaled = (f64::from(depth.get_pixel(x, y)[0]) * alpha).abs();
        Luma([scaled.round_ties_even().min(255.0) as u8])
    })
}

/// False-color an 8-bit image with the "bone" ramp (blue-tinted gray scale).
pub fn apply_bone_colormap(gray: &GrayImage) -> RgbImage {
    let lut: Vec<Rgb<u8>> = (0..=255u8).map(bone).collect();
    let (width, height) = gray.dimensions();
    RgbImage::from_fn(width, height, |x, y| lut[usize::from(gray.get_pixel(x, y)[0])])
}

// bone = (7 * gray + reversed hot) / 8, with hot's channels swapped (red <-> blue).
fn bone(value: u8) -> Rgb<u8> {
    let v = f64::from(value) / 255.0;
    let ramp = |start: f64, span: f64| ((v - start) / span).clamp(0.0, 1.0);
    let hot_r = ramp(0.0, 3.0 / 8.0);
    let hot_g = ramp(3.0 / 8.0, 3.0 / 8.0);
    let hot_b = ramp(6.0 / 8.0, 2.0 / 8.0);
    let mix = |hot: f64| ((7.0 * v + hot) / 8.0 * 255.0).round() as u8;
    Rgb([mix(hot_b), mix(hot_g), mix(hot_r)])
}

/// Build a depth image from little-endian Z16 samples.
pub fn raw_depth_from_le_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<DepthImage, DataError> {
    let expected = width as usize * height as usize * 2;
    if bytes.len() != expected {
        return Err(DataError::Validation(format!(
            "depth buffer for {width}x{height} must hold {expected} bytes, got {}",
            bytes.len()
        )));
    }
    let samples: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    DepthImage::from_raw(width, height, samples)
        .ok_or_else(|| DataError::Validation("depth buffer does not match dimensions".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_abs_saturates() {
        let depth = DepthImage::from_raw(4, 1, vec![0, 100, 2000, 60000]).unwrap();
        let scaled = scale_abs(&depth, DEFAULT_DEPTH_ALPHA);
        assert_eq!(scaled.into_raw(), vec![0, 5, 100, 255]);
    }

    #[test]
    fn test_scale_abs_rounds_half_to_even() {
        // 50 * 0.05 = 2.5 -> 2, 70 * 0.05 = 3.5 -> 4
        let depth = DepthImage::from_raw(2, 1, vec![50, 70]).unwrap();
        assert_eq!(scale_abs(&depth, 0.05).into_raw(), vec![2, 4]);
    }

    #[test]
    fn test_bone_endpoints() {
        assert_eq!(bone(0), Rgb([0, 0, 0]));
        assert_eq!(bone(255), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_bone_is_blue_tinted_and_monotonic() {
        let mid = bone(128);
        assert!(mid[2] > mid[0], "bone midtones lean blue: {mid:?}");
        let mut previous = bone(0);
        for value in 1..=255u8 {
            let current = bone(value);
            for channel in 0..3 {
                assert!(current[channel] >= previous[channel]);
            }
            previous = current;
        }
    }

    #[test]
    fn test_colormap_preserves_dimensions() {
        let gray = GrayImage::from_fn(6, 3, |x, _| Luma([x as u8 * 40]));
        let colored = apply_bone_colormap(&gray);
        assert_eq!(colored.dimensions(), (6, 3));
        assert_eq!(*colored.get_pixel(0, 0), bone(0));
    }

    #[test]
    fn test_raw_depth_from_le_bytes() {
        let depth = raw_depth_from_le_bytes(2, 1, &[0x34, 0x12, 0xff, 0x00]).unwrap();
        assert_eq!(depth.into_raw(), vec![0x1234, 0x00ff]);
    }

    #[test]
    fn test_raw_depth_size_mismatch() {
        let err = raw_depth_from_le_bytes(2, 2, &[0, 0, 0]).unwrap_err();
        assert!(err.is_validation());
    }
}
