//! Focus-quality scoring.
//!
//! The score is the variance of the 4-neighbour Laplacian response over the gray-scale
//! image. It is a relative metric: only compare scores of frames showing the same scene.
//! Color frames are reduced to gray with Rec.601 weights (0.299, 0.587, 0.114).

use image::{GrayImage, Luma, RgbImage};

/// Score a color frame. Higher is sharper.
pub fn sharpness(image: &RgbImage) -> f64 {
    laplacian_variance(&to_gray(image))
}

/// Rec.601 luma, rounded to the nearest level.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Variance of the discrete Laplacian of a single-channel image.
///
/// Borders are handled by reflecting about the edge pixel (`dcb|abcd|cba`), so a flat
/// image scores exactly zero.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return 0.0;
    }

    let sample = |x: i64, y: i64| -> f64 {
        let x = reflect(x, width);
        let y = reflect(y, height);
        f64::from(gray.get_pixel(x, y)[0])
    };

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..i64::from(height) {
        for x in 0..i64::from(width) {
            let response = sample(x - 1, y) + sample(x + 1, y) + sample(x, y - 1)
                + sample(x, y + 1)
                - 4.0 * sample(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

// Reflect an out-of-range index back into [0, len) without repeating the edge sample.
fn reflect(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len == 1 {
        return 0;
    }
    let mut index = index;
    if index < 0 {
        index = -index;
    }
    if index >= len {
        index = 2 * (len - 1) - index;
    }
    index.clamp(0, len - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, imageops};

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_flat_image_scores_zero() {
        let flat = GrayImage::from_pixel(16, 12, Luma([128]));
        assert_eq!(laplacian_variance(&flat), 0.0);

        let flat_rgb = RgbImage::from_pixel(9, 9, Rgb([10, 200, 30]));
        assert_eq!(sharpness(&flat_rgb), 0.0);
    }

    #[test]
    fn test_empty_image_scores_zero() {
        assert_eq!(laplacian_variance(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn test_edges_score_higher_than_blurred() {
        let sharp = checkerboard(32, 4);
        let blurred = imageops::blur(&sharp, 2.0);
        let sharp_score = laplacian_variance(&sharp);
        let blurred_score = laplacian_variance(&blurred);
        assert!(sharp_score > 0.0);
        assert!(
            sharp_score > blurred_score,
            "sharp {sharp_score} should exceed blurred {blurred_score}"
        );
    }

    #[test]
    fn test_single_pixel_edge() {
        // A lone bright pixel: response -4v at the pixel, +v at its four neighbours.
        let mut image = GrayImage::from_pixel(5, 5, Luma([0]));
        image.put_pixel(2, 2, Luma([100]));
        let responses = [-400.0f64, 100.0, 100.0, 100.0, 100.0];
        let n = 25.0;
        let mean: f64 = responses.iter().sum::<f64>() / n;
        let mean_sq: f64 = responses.iter().map(|r| r * r).sum::<f64>() / n;
        let expected = mean_sq - mean * mean;
        assert!((laplacian_variance(&image) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_gray_uses_rec601_weights() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = to_gray(&image);
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
        assert_eq!(to_gray(&RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])))[(0, 0)][0], 255);
    }

    #[test]
    fn test_reflect_indices() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-1, 1), 0);
    }
}
