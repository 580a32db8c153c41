//! Seam to a locally attached depth-streaming device runtime.
//!
//! The runtime handles enumeration, stream negotiation, color conversion and
//! depth-to-color alignment. This crate only needs to enumerate devices, start a
//! pipeline with a stream configuration and pull frame sets from it.

use crate::error::CaptureError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// An attached device as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub serial_number: String,
}

/// Resolution and rate of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamProfile {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }
}

/// Streams to enable on a device. Color is delivered as RGB8, depth as Z16.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub serial_number: String,
    pub color: StreamProfile,
    pub depth: StreamProfile,
}

/// Raw Z16 depth payload (little-endian `u16` samples, row-major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthPayload {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One synchronized set of frames from a running pipeline.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    pub color: Option<RgbImage>,
    pub depth: Option<DepthPayload>,
}

/// Device runtime context, constructed once by the process and passed in explicitly.
pub trait DepthContext: Send + Sync {
    /// Enumerate the devices attached right now.
    fn query_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;

    /// Start streaming on the device named in `config`.
    fn start_pipeline(&self, config: &PipelineConfig) -> Result<Box<dyn DepthPipeline>, CaptureError>;
}

/// A started device pipeline.
pub trait DepthPipeline: Send {
    /// Block until the next frame set is available.
    fn wait_for_frames(&mut self) -> Result<FrameSet, CaptureError>;
}
