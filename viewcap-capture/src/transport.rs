//! Publish/subscribe seam used by the stream subscriber backend.
//!
//! A transport delivers already-decoded messages to registered callbacks on a thread
//! of its choosing. Real middleware bindings implement [`ImageTransport`];
//! [`LocalTransport`] is an in-process implementation where callbacks run on the
//! publisher's thread.

use crate::error::CaptureError;
use image::RgbImage;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use viewcap_data::{CameraProperties, DepthImage};

/// Channel layout of a color message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A decoded image message.
#[derive(Debug, Clone)]
pub enum ImageMessage {
    /// 8-bit 3-channel color in the given channel order.
    Color { image: RgbImage, order: ChannelOrder },
    /// 16-bit depth samples aligned to the color stream.
    Depth(DepthImage),
}

/// Calibration published alongside a color stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    pub width: u32,
    pub height: u32,
    /// Row-major 3x3 camera matrix.
    pub k: [f64; 9],
    /// Plumb-bob distortion `[k1, k2, p1, p2, k3]`.
    pub distortion: Vec<f64>,
}

impl CameraInfo {
    /// Convert the published calibration into a camera properties record.
    pub fn to_properties(&self) -> CameraProperties {
        let mut properties = CameraProperties::new(
            f64::from(self.width),
            f64::from(self.height),
            self.k[0],
            self.k[4],
        )
        .with_principal_point(self.k[2], self.k[5]);

        let coefficient = |index: usize| self.distortion.get(index).copied().unwrap_or(0.0);
        properties.k1 = coefficient(0);
        properties.k2 = coefficient(1);
        properties.p1 = coefficient(2);
        properties.p2 = coefficient(3);
        properties.k3 = coefficient(4);
        properties
    }
}

pub type ImageCallback = Box<dyn Fn(ImageMessage) + Send + Sync>;
pub type InfoCallback = Box<dyn Fn(CameraInfo) + Send + Sync>;

/// Registration of feed callbacks on named topics.
pub trait ImageTransport: Send + Sync {
    fn subscribe_image(&self, topic: &str, callback: ImageCallback) -> Result<(), CaptureError>;

    fn subscribe_info(&self, topic: &str, callback: InfoCallback) -> Result<(), CaptureError>;
}

#[derive(Default)]
struct Subscribers {
    image: HashMap<String, Vec<Arc<dyn Fn(ImageMessage) + Send + Sync>>>,
    info: HashMap<String, Vec<Arc<dyn Fn(CameraInfo) + Send + Sync>>>,
}

/// In-process transport.
#[derive(Clone, Default)]
pub struct LocalTransport {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an image message to every subscriber of `topic`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish_image(&self, topic: &str, message: ImageMessage) -> usize {
        let callbacks = match self.subscribers.read() {
            Ok(subscribers) => subscribers.image.get(topic).cloned().unwrap_or_default(),
            Err(_) => {
                warn!("Subscriber registry poisoned, dropping message on {}", topic);
                return 0;
            }
        };
        debug!("Publishing image on {} to {} subscribers", topic, callbacks.len());
        for callback in &callbacks {
            callback(message.clone());
        }
        callbacks.len()
    }

    /// Deliver a calibration message to every subscriber of `topic`.
    pub fn publish_info(&self, topic: &str, info: CameraInfo) -> usize {
        let callbacks = match self.subscribers.read() {
            Ok(subscribers) => subscribers.info.get(topic).cloned().unwrap_or_default(),
            Err(_) => {
                warn!("Subscriber registry poisoned, dropping message on {}", topic);
                return 0;
            }
        };
        for callback in &callbacks {
            callback(info.clone());
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .map(|subscribers| {
                subscribers.image.get(topic).map_or(0, Vec::len)
                    + subscribers.info.get(topic).map_or(0, Vec::len)
            })
            .unwrap_or(0)
    }

    fn registry_error() -> CaptureError {
        CaptureError::Connection("subscriber registry poisoned".into())
    }
}

impl ImageTransport for LocalTransport {
    fn subscribe_image(&self, topic: &str, callback: ImageCallback) -> Result<(), CaptureError> {
        let mut subscribers = self.subscribers.write().map_err(|_| Self::registry_error())?;
        subscribers
            .image
            .entry(topic.to_string())
            .or_default()
            .push(Arc::from(callback));
        debug!("Subscribed to image topic {}", topic);
        Ok(())
    }

    fn subscribe_info(&self, topic: &str, callback: InfoCallback) -> Result<(), CaptureError> {
        let mut subscribers = self.subscribers.write().map_err(|_| Self::registry_error())?;
        subscribers
            .info
            .entry(topic.to_string())
            .or_default()
            .push(Arc::from(callback));
        debug!("Subscribed to info topic {}", topic);
        Ok(())
    }
}
