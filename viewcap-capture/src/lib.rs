//! Viewcap Capture - Unified color/depth capture
//!
//! Every supported source is exposed through the same [`CaptureBackend`] trait:
//!
//! - Published sensor streams ([`StreamSubscriberBackend`]), push-style with a staleness wait
//! - Locally attached depth devices ([`DepthPipelineBackend`]), pull-style
//! - Tethered still cameras ([`TetheredStillBackend`]), capture-then-download
//!
//! Backends are built by [`CaptureFactory`] from a kind tag and flat parameters.
//! Device runtimes are injected as trait objects so no global device state exists.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use viewcap_capture::{CaptureBackend, CaptureFactory, CaptureParams, LocalTransport};
//!
//! let factory = CaptureFactory::new().with_transport(Arc::new(LocalTransport::new()));
//! let mut backend = factory.create("stream", &CaptureParams::default())?;
//! if let Some(frame) = backend.get_current_rgb_image()? {
//!     // Process frame...
//! }
//! ```

mod backend;
mod device;
mod error;
mod factory;
mod pipeline;
mod staleness;
mod stream;
mod tethered;
mod transport;

#[cfg(test)]
mod testing;

pub use backend::{Backend, CaptureBackend, DepthCapture};
pub use device::{DepthContext, DepthPayload, DepthPipeline, DeviceInfo, FrameSet, PipelineConfig, StreamProfile};
pub use error::CaptureError;
pub use factory::{CaptureConfig, CaptureFactory, CaptureKind, CaptureParams};
pub use pipeline::{DEPTH_FPS, DepthPipelineBackend, MAX_DEPTH_HEIGHT, MAX_DEPTH_WIDTH, PipelineBackendConfig};
pub use staleness::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WAIT, LivenessState, StalenessTracker};
pub use stream::{StreamConfig, StreamSubscriberBackend};
pub use tethered::{CameraFilePath, CameraPort, TetheredConfig, TetheredDriver, TetheredSession, TetheredStillBackend};
pub use transport::{CameraInfo, ChannelOrder, ImageCallback, ImageMessage, ImageTransport, InfoCallback, LocalTransport};
