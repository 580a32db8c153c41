//! Backend driving a tethered still camera.
//!
//! Each request triggers a capture on the camera, downloads the resulting file and
//! decodes it in memory. The session is opened once at construction.

use crate::backend::{CaptureBackend, Sealed};
use crate::error::CaptureError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use viewcap_data::{CropSpec, crop};

/// A detected camera and the port address it is attached on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraPort {
    pub name: String,
    pub address: String,
}

/// Location of a captured file on the camera's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFilePath {
    pub folder: String,
    pub name: String,
}

impl fmt::Display for CameraFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.name)
    }
}

/// Tethering library entry point.
pub trait TetheredDriver: Send + Sync {
    /// List cameras currently attached.
    fn autodetect(&self) -> Result<Vec<CameraPort>, CaptureError>;

    /// Open and initialize a session on the camera at `address`.
    fn open(&self, address: &str) -> Result<Box<dyn TetheredSession>, CaptureError>;
}

/// An initialized camera session.
pub trait TetheredSession: Send {
    /// Fire the shutter and return where the image was stored.
    fn capture(&mut self) -> Result<CameraFilePath, CaptureError>;

    /// Transfer a stored file's encoded bytes.
    fn download(&mut self, file: &CameraFilePath) -> Result<Vec<u8>, CaptureError>;
}

/// Settings for a tethered still backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetheredConfig {
    /// Substring matched against detected camera names.
    pub device_name: String,
    pub crop: CropSpec,
}

/// Capture-then-download backend over a [`TetheredDriver`].
pub struct TetheredStillBackend {
    session: Box<dyn TetheredSession>,
    port: CameraPort,
    config: TetheredConfig,
    session_established: bool,
}

impl TetheredStillBackend {
    /// Find the camera whose name contains `config.device_name` and open a session.
    ///
    /// When several cameras match, the last one detected is used.
    pub fn new(driver: Arc<dyn TetheredDriver>, config: TetheredConfig) -> Result<Self, CaptureError> {
        config.crop.validate()?;

        let port = driver
            .autodetect()?
            .into_iter()
            .filter(|port| port.name.contains(&config.device_name))
            .last()
            .ok_or_else(|| {
                CaptureError::Connection(format!(
                    "unable to connect to camera with name: {}",
                    config.device_name
                ))
            })?;

        let session = driver.open(&port.address)?;
        info!("Tethered camera '{}' connected on {}", port.name, port.address);

        Ok(Self {
            session,
            port,
            config,
            session_established: true,
        })
    }

    /// The camera this backend is bound to.
    pub fn port(&self) -> &CameraPort {
        &self.port
    }

    pub fn config(&self) -> &TetheredConfig {
        &self.config
    }
}

impl Sealed for TetheredStillBackend {}

impl CaptureBackend for TetheredStillBackend {
    fn is_connected(&self) -> bool {
        self.session_established
    }

    fn get_current_rgb_image(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let file = self.session.capture()?;
        info!("Image captured and stored at: {}", file);

        let bytes = self.session.download(&file)?;
        debug!("Downloaded {} bytes", bytes.len());

        let image = image::load_from_memory(&bytes)?.to_rgb8();
        Ok(Some(crop(&image, &self.config.crop)?))
    }
}
