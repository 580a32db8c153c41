//! Symmetric crop windows.
//!
//! Every backend crops its frames the same way: each axis is trimmed evenly from
//! both sides down to the target size, then the window is shifted by a pixel offset
//! and clamped to the source bounds. Offsets never grow the window, so an extreme
//! offset can leave fewer than `target` pixels (or none) on that axis.
//!
//! When `source - target` is odd the window still keeps exactly `target` pixels; the
//! spare pixel is trimmed from the far edge rather than kept.

use crate::error::DataError;
use image::{ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Target dimensions and offsets applied to every frame a backend returns.
///
/// `None` for a dimension leaves that axis untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSpec {
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl CropSpec {
    /// Create a centered crop spec.
    pub fn new(height: Option<i64>, width: Option<i64>) -> Self {
        Self {
            height,
            width,
            offset_x: 0,
            offset_y: 0,
        }
    }

    /// Shift the crop window by `(x, y)` pixels.
    pub fn with_offset(mut self, offset_x: i64, offset_y: i64) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// Check that any present target dimension is at least one pixel.
    pub fn validate(&self) -> Result<(), DataError> {
        if let Some(height) = self.height {
            if height <= 0 {
                return Err(DataError::Validation(format!(
                    "crop height must be larger than 0 pixels, got {height}"
                )));
            }
        }
        if let Some(width) = self.width {
            if width <= 0 {
                return Err(DataError::Validation(format!(
                    "crop width must be larger than 0 pixels, got {width}"
                )));
            }
        }
        Ok(())
    }

    /// True when neither axis is cropped.
    pub fn is_noop(&self) -> bool {
        self.height.is_none() && self.width.is_none()
    }
}

/// Compute the kept index range on one axis.
///
/// `target` must already be validated (`>= 1` when present).
pub fn crop_window(source: u32, target: Option<i64>, offset: i64) -> Range<u32> {
    let source_len = i64::from(source);
    let target = match target {
        Some(target) if target < source_len => target,
        _ => return 0..source,
    };

    let margin = source_len.saturating_sub(target) / 2;
    let start = margin.saturating_add(offset).clamp(0, source_len);
    let end = margin
        .saturating_add(target)
        .saturating_add(offset)
        .clamp(0, source_len);

    // both ends are clamped into [0, source], so the casts are lossless
    start as u32..end as u32
}

/// Crop `image` according to `spec`, returning a new independently owned buffer.
pub fn crop<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    spec: &CropSpec,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, DataError>
where
    P: Pixel,
{
    spec.validate()?;

    let (width, height) = image.dimensions();
    let rows = crop_window(height, spec.height, spec.offset_y);
    let cols = crop_window(width, spec.width, spec.offset_x);

    if rows == (0..height) && cols == (0..width) {
        return Ok(image.clone());
    }

    let out_width = cols.end - cols.start;
    let out_height = rows.end - rows.start;
    debug!(
        "Cropping {}x{} -> {}x{} (rows {:?}, cols {:?})",
        width, height, out_width, out_height, rows, cols
    );

    Ok(ImageBuffer::from_fn(out_width, out_height, |x, y| {
        *image.get_pixel(cols.start + x, rows.start + y)
    }))
}
