//! Backend construction from a kind tag and flat parameters.

use crate::backend::Backend;
use crate::device::DepthContext;
use crate::error::CaptureError;
use crate::pipeline::{DepthPipelineBackend, PipelineBackendConfig};
use crate::staleness::StalenessTracker;
use crate::stream::{StreamConfig, StreamSubscriberBackend};
use crate::tethered::{TetheredConfig, TetheredDriver, TetheredStillBackend};
use crate::transport::ImageTransport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use viewcap_data::{CropSpec, DEFAULT_DEPTH_ALPHA, DataError};

/// The closed set of backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    /// Subscriber on a published sensor stream.
    Stream,
    /// Locally attached depth device pipeline.
    Pipeline,
    /// Tethered still camera.
    Tethered,
}

impl FromStr for CaptureKind {
    type Err = CaptureError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "stream" | "ros" => Ok(CaptureKind::Stream),
            "pipeline" | "realsense" => Ok(CaptureKind::Pipeline),
            "tethered" | "gphoto" => Ok(CaptureKind::Tethered),
            _ => Err(CaptureError::Configuration(format!(
                "unknown capture backend type: {tag}"
            ))),
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            CaptureKind::Stream => "stream",
            CaptureKind::Pipeline => "pipeline",
            CaptureKind::Tethered => "tethered",
        };
        f.write_str(tag)
    }
}

/// Flat construction parameters; each variant reads only the fields it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureParams {
    /// Stream: base topic name.
    pub topic: String,
    /// Pipeline: device serial number.
    pub serial_number: String,
    /// Tethered: substring of the camera name.
    pub device_name: String,
    pub stream_width: u32,
    pub stream_height: u32,
    pub fps: u32,
    pub crop_width: Option<i64>,
    pub crop_height: Option<i64>,
    pub offset_x: i64,
    pub offset_y: i64,
    /// Stream: rotate frames by 180 degrees.
    pub flip: bool,
    /// Stream: swap BGR messages to RGB.
    pub normalize_channels: bool,
    pub depth_alpha: f64,
    pub staleness: StalenessTracker,
}

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            topic: "camera".to_string(),
            serial_number: String::new(),
            device_name: String::new(),
            stream_width: 1920,
            stream_height: 1080,
            fps: 30,
            crop_width: None,
            crop_height: None,
            offset_x: 0,
            offset_y: 0,
            flip: false,
            normalize_channels: true,
            depth_alpha: DEFAULT_DEPTH_ALPHA,
            staleness: StalenessTracker::default(),
        }
    }
}

impl CaptureParams {
    pub fn crop(&self) -> CropSpec {
        CropSpec::new(self.crop_height, self.crop_width).with_offset(self.offset_x, self.offset_y)
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            topic: self.topic.clone(),
            crop: self.crop(),
            normalize_channels: self.normalize_channels,
            flip: self.flip,
            depth_alpha: self.depth_alpha,
            staleness: self.staleness,
        }
    }

    pub fn pipeline_config(&self) -> PipelineBackendConfig {
        PipelineBackendConfig {
            serial_number: self.serial_number.clone(),
            stream_width: self.stream_width,
            stream_height: self.stream_height,
            fps: self.fps,
            crop: self.crop(),
        }
    }

    pub fn tethered_config(&self) -> TetheredConfig {
        TetheredConfig {
            device_name: self.device_name.clone(),
            crop: self.crop(),
        }
    }
}

/// A capture configuration record: `{"kind": "...", ...params}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub kind: String,
    #[serde(flatten)]
    pub params: CaptureParams,
}

impl CaptureConfig {
    /// Read a JSON capture configuration.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataError::NotFound(path.to_path_buf()).into());
        }
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.params.crop().validate()?;
        Ok(config)
    }

    pub fn kind(&self) -> Result<CaptureKind, CaptureError> {
        self.kind.parse()
    }
}

/// Builds backends from explicitly supplied device collaborators.
#[derive(Default, Clone)]
pub struct CaptureFactory {
    transport: Option<Arc<dyn ImageTransport>>,
    depth_context: Option<Arc<dyn DepthContext>>,
    tethered_driver: Option<Arc<dyn TetheredDriver>>,
}

impl CaptureFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: Arc<dyn ImageTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_depth_context(mut self, context: Arc<dyn DepthContext>) -> Self {
        self.depth_context = Some(context);
        self
    }

    pub fn with_tethered_driver(mut self, driver: Arc<dyn TetheredDriver>) -> Self {
        self.tethered_driver = Some(driver);
        self
    }

    /// Build the backend named by `kind`.
    pub fn create(&self, kind: &str, params: &CaptureParams) -> Result<Backend, CaptureError> {
        let kind: CaptureKind = kind.parse()?;
        info!("Creating {} capture backend", kind);

        match kind {
            CaptureKind::Stream => {
                let transport = self.transport.as_deref().ok_or_else(|| missing("image transport"))?;
                Ok(Backend::Stream(StreamSubscriberBackend::new(
                    transport,
                    params.stream_config(),
                )?))
            }
            CaptureKind::Pipeline => {
                let context = self.depth_context.clone().ok_or_else(|| missing("depth device context"))?;
                Ok(Backend::Pipeline(DepthPipelineBackend::new(
                    context,
                    params.pipeline_config(),
                )?))
            }
            CaptureKind::Tethered => {
                let driver = self.tethered_driver.clone().ok_or_else(|| missing("tethered camera driver"))?;
                Ok(Backend::Tethered(TetheredStillBackend::new(
                    driver,
                    params.tethered_config(),
                )?))
            }
        }
    }

    pub fn create_from_config(&self, config: &CaptureConfig) -> Result<Backend, CaptureError> {
        self.create(&config.kind, &config.params)
    }
}

fn missing(collaborator: &str) -> CaptureError {
    CaptureError::Configuration(format!("no {collaborator} registered with the capture factory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CaptureBackend;
    use crate::device::FrameSet;
    use crate::testing::{MockDepthContext, MockTetheredDriver};
    use crate::transport::{ChannelOrder, ImageMessage, LocalTransport};
    use image::{Rgb, RgbImage};
    use std::io::Write;
    use std::time::Duration;

    fn params() -> CaptureParams {
        CaptureParams {
            topic: "rig".to_string(),
            serial_number: "841512070123".to_string(),
            device_name: "EOS".to_string(),
            crop_width: Some(4),
            crop_height: Some(2),
            staleness: StalenessTracker::new(Duration::from_millis(5), 3),
            ..CaptureParams::default()
        }
    }

    #[test]
    fn test_kind_tags_and_aliases() {
        assert_eq!("stream".parse::<CaptureKind>().unwrap(), CaptureKind::Stream);
        assert_eq!("ros".parse::<CaptureKind>().unwrap(), CaptureKind::Stream);
        assert_eq!("RealSense".parse::<CaptureKind>().unwrap(), CaptureKind::Pipeline);
        assert_eq!("gphoto".parse::<CaptureKind>().unwrap(), CaptureKind::Tethered);
        assert_eq!(CaptureKind::Tethered.to_string(), "tethered");
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let err = CaptureFactory::new().create("webcam", &params()).err().unwrap();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_missing_collaborator_is_configuration_error() {
        let err = CaptureFactory::new().create("pipeline", &params()).err().unwrap();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_stream_backend_uses_forwarded_params() {
        let transport = Arc::new(LocalTransport::new());
        let factory = CaptureFactory::new().with_transport(transport.clone());
        let mut backend = factory.create("stream", &params()).unwrap();
        assert_eq!(backend.kind(), CaptureKind::Stream);

        transport.publish_image(
            "rig/color/image_raw",
            ImageMessage::Color {
                image: RgbImage::new(10, 10),
                order: ChannelOrder::Rgb,
            },
        );
        let frame = backend.get_current_rgb_image().unwrap().unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
        assert!(backend.as_depth().is_some());
    }

    #[test]
    fn test_pipeline_backend_uses_forwarded_params() {
        let context = Arc::new(MockDepthContext::with_devices(&["841512070123"]));
        context.push_frames(FrameSet {
            color: Some(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))),
            depth: None,
        });
        let factory = CaptureFactory::new().with_depth_context(context.clone());
        let mut backend = factory.create("realsense", &params()).unwrap();

        assert_eq!(backend.kind(), CaptureKind::Pipeline);
        assert!(backend.is_connected());
        assert_eq!(context.started()[0].color.width, 1920);
        let frame = backend.get_current_rgb_image().unwrap().unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
    }

    #[test]
    fn test_tethered_backend_has_no_depth() {
        let driver = Arc::new(MockTetheredDriver::with_cameras(&[("Canon EOS R5", "usb:001,006")]));
        let factory = CaptureFactory::new().with_tethered_driver(driver);
        let mut backend = factory.create("tethered", &params()).unwrap();
        assert_eq!(backend.kind(), CaptureKind::Tethered);
        assert!(backend.is_connected());
        assert!(backend.as_depth().is_none());
    }

    #[test]
    fn test_invalid_crop_param_is_validation_error() {
        let transport = Arc::new(LocalTransport::new());
        let factory = CaptureFactory::new().with_transport(transport);
        let bad = CaptureParams {
            crop_width: Some(-1),
            ..params()
        };
        let err = factory.create("stream", &bad).err().unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"kind": "pipeline", "serial_number": "A1", "stream_width": 1280, "crop_width": 960,
                "staleness": {{"wait": 100}}}}"#
        )
        .unwrap();

        let config = CaptureConfig::load(file.path()).unwrap();
        assert_eq!(config.kind().unwrap(), CaptureKind::Pipeline);
        assert_eq!(config.params.serial_number, "A1");
        assert_eq!(config.params.stream_width, 1280);
        assert_eq!(config.params.stream_height, 1080);
        assert_eq!(config.params.crop(), CropSpec::new(None, Some(960)));
        assert_eq!(config.params.staleness.wait, Duration::from_millis(100));
    }

    #[test]
    fn test_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaptureConfig::load(dir.path().join("capture.json")).unwrap_err();
        assert!(err.is_not_found());
    }
}
