//! The capture contract shared by every backend.

use crate::error::CaptureError;
use crate::factory::CaptureKind;
use crate::pipeline::DepthPipelineBackend;
use crate::stream::StreamSubscriberBackend;
use crate::tethered::TetheredStillBackend;
use image::RgbImage;
use viewcap_data::RawFrame;

mod private {
    pub trait Sealed {}
}

pub(crate) use private::Sealed;

/// A source of color frames.
///
/// Implemented only by the backends in this crate. Every returned frame is already
/// cropped and owned by the caller.
pub trait CaptureBackend: Sealed {
    /// Liveness probe.
    ///
    /// Push-style backends wait one staleness interval for a first frame before
    /// reporting `false`; pull-style backends ask the device directly.
    fn is_connected(&self) -> bool;

    /// The freshest color frame, or `None` if a push-style backend has never
    /// received one.
    fn get_current_rgb_image(&mut self) -> Result<Option<RgbImage>, CaptureError>;
}

/// A backend that also produces depth frames.
pub trait DepthCapture: CaptureBackend {
    /// The freshest depth frame, with the same freshness contract as color.
    ///
    /// Device pipelines return raw 16-bit samples; stream subscribers return a
    /// false-colored 8-bit rendering.
    fn get_current_depth_image(&mut self) -> Result<Option<RawFrame>, CaptureError>;
}

/// A constructed backend of one of the known variants.
pub enum Backend {
    Stream(StreamSubscriberBackend),
    Pipeline(DepthPipelineBackend),
    Tethered(TetheredStillBackend),
}

impl Backend {
    pub fn kind(&self) -> CaptureKind {
        match self {
            Backend::Stream(_) => CaptureKind::Stream,
            Backend::Pipeline(_) => CaptureKind::Pipeline,
            Backend::Tethered(_) => CaptureKind::Tethered,
        }
    }

    /// Depth access, for variants that produce depth.
    pub fn as_depth(&mut self) -> Option<&mut dyn DepthCapture> {
        match self {
            Backend::Stream(backend) => Some(backend as &mut dyn DepthCapture),
            Backend::Pipeline(backend) => Some(backend as &mut dyn DepthCapture),
            Backend::Tethered(_) => None,
        }
    }
}

impl Sealed for Backend {}

impl CaptureBackend for Backend {
    fn is_connected(&self) -> bool {
        match self {
            Backend::Stream(backend) => backend.is_connected(),
            Backend::Pipeline(backend) => backend.is_connected(),
            Backend::Tethered(backend) => backend.is_connected(),
        }
    }

    fn get_current_rgb_image(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        match self {
            Backend::Stream(backend) => backend.get_current_rgb_image(),
            Backend::Pipeline(backend) => backend.get_current_rgb_image(),
            Backend::Tethered(backend) => backend.get_current_rgb_image(),
        }
    }
}
