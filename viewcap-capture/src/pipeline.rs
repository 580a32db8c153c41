//! Backend pulling synchronized color and depth from a device pipeline.

use crate::backend::{CaptureBackend, DepthCapture, Sealed};
use crate::device::{DepthContext, DepthPipeline, FrameSet, PipelineConfig, StreamProfile};
use crate::error::CaptureError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use viewcap_data::{CropSpec, RawFrame, crop, raw_depth_from_le_bytes};

/// Largest depth resolution requested from the device.
pub const MAX_DEPTH_WIDTH: u32 = 1280;
pub const MAX_DEPTH_HEIGHT: u32 = 720;
/// Depth stream rate, independent of the color rate.
pub const DEPTH_FPS: u32 = 6;

/// Settings for a depth pipeline backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineBackendConfig {
    pub serial_number: String,
    pub stream_width: u32,
    pub stream_height: u32,
    pub fps: u32,
    pub crop: CropSpec,
}

impl Default for PipelineBackendConfig {
    fn default() -> Self {
        Self {
            serial_number: String::new(),
            stream_width: 1920,
            stream_height: 1080,
            fps: 30,
            crop: CropSpec::default(),
        }
    }
}

impl PipelineBackendConfig {
    /// Stream configuration sent to the device runtime.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            serial_number: self.serial_number.clone(),
            color: StreamProfile::new(self.stream_width, self.stream_height, self.fps),
            depth: StreamProfile::new(
                self.stream_width.min(MAX_DEPTH_WIDTH),
                self.stream_height.min(MAX_DEPTH_HEIGHT),
                DEPTH_FPS,
            ),
        }
    }
}

/// Pull-style backend over a [`DepthContext`].
pub struct DepthPipelineBackend {
    context: Arc<dyn DepthContext>,
    pipeline: Box<dyn DepthPipeline>,
    config: PipelineBackendConfig,
}

impl DepthPipelineBackend {
    /// Start color and depth streaming on the configured device.
    pub fn new(context: Arc<dyn DepthContext>, config: PipelineBackendConfig) -> Result<Self, CaptureError> {
        config.crop.validate()?;
        let pipeline_config = config.pipeline_config();
        let pipeline = context.start_pipeline(&pipeline_config)?;
        info!(
            "Depth pipeline started on '{}': color {}x{}@{}, depth {}x{}@{}",
            config.serial_number,
            pipeline_config.color.width,
            pipeline_config.color.height,
            pipeline_config.color.fps,
            pipeline_config.depth.width,
            pipeline_config.depth.height,
            pipeline_config.depth.fps
        );
        Ok(Self {
            context,
            pipeline,
            config,
        })
    }

    pub fn config(&self) -> &PipelineBackendConfig {
        &self.config
    }

    fn next_frames(&mut self) -> Result<FrameSet, CaptureError> {
        let frames = self.pipeline.wait_for_frames()?;
        debug!(
            "Frame set received (color: {}, depth: {})",
            frames.color.is_some(),
            frames.depth.is_some()
        );
        Ok(frames)
    }
}

impl Sealed for DepthPipelineBackend {}

impl CaptureBackend for DepthPipelineBackend {
    fn is_connected(&self) -> bool {
        match self.context.query_devices() {
            Ok(devices) => devices
                .iter()
                .any(|device| device.serial_number == self.config.serial_number),
            Err(err) => {
                warn!("Device enumeration failed: {}", err);
                false
            }
        }
    }

    fn get_current_rgb_image(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let color = self
            .next_frames()?
            .color
            .ok_or(CaptureError::MissingStream("color"))?;
        Ok(Some(crop(&color, &self.config.crop)?))
    }
}

impl DepthCapture for DepthPipelineBackend {
    fn get_current_depth_image(&mut self) -> Result<Option<RawFrame>, CaptureError> {
        let payload = self
            .next_frames()?
            .depth
            .ok_or(CaptureError::MissingStream("depth"))?;
        let depth = raw_depth_from_le_bytes(payload.width, payload.height, &payload.data)?;
        Ok(Some(RawFrame::Depth(crop(&depth, &self.config.crop)?)))
    }
}
